pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{openai::OpenAiChooser, telegram::TelegramClient};
pub use config::{AppConfig, CliArgs};
pub use crate::core::{catalog::Catalog, dialogue::Dialogue, recommender::Recommender};
pub use utils::error::{BotError, Result};
