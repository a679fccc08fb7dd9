use crate::core::prompt::ChoicePrompt;
use crate::domain::model::{Message, Update, User, Venue};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where the venue catalog comes from.
#[async_trait]
pub trait VenueSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Venue>>;

    fn describe(&self) -> String;
}

/// Asks a model to pick one of the numbered candidates; returns the raw answer text.
#[async_trait]
pub trait VenueChooser: Send + Sync {
    async fn choose(&self, prompt: &ChoicePrompt) -> Result<String>;
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;

    /// The bot's own account; its username tells `/start@ThisBot` apart from other bots' commands.
    async fn get_me(&self) -> Result<User>;

    async fn drop_pending_updates(&self) -> Result<()>;

    async fn send_text(&self, chat_id: i64, text: &str, html: bool) -> Result<Message>;

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<Message>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;
}
