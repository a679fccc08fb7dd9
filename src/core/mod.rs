pub mod bot;
pub mod catalog;
pub mod dialogue;
pub mod matching;
pub mod prompt;
pub mod recommender;

pub use crate::domain::model::{Recommendation, Venue};
pub use crate::domain::ports::{ChatApi, VenueChooser, VenueSource};
pub use crate::utils::error::Result;
