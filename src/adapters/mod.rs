// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod health;
pub mod openai;
pub mod sheets;
pub mod telegram;
