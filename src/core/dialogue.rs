//! Per-user conversation: `/start`, then one free-text request, then a card.

use crate::core::recommender::Recommender;
use crate::domain::model::{Recommendation, SessionState, Update};
use crate::domain::ports::{ChatApi, VenueChooser};
use crate::utils::error::{BotError, Result};
use crate::utils::links::escape_html;
use std::collections::HashMap;
use tokio::sync::Mutex;

pub const GREETING: &str = "🍽 Привіт! Я допоможу тобі знайти ідеальний ресторан!\n\n\
Розкажи мені про своє побажання. Наприклад:\n\
• 'Хочу місце для обіду з сім'єю'\n\
• 'Потрібен ресторан для побачення'\n\
• 'Шукаю піцу з друзями'\n\n\
Напиши, що ти шукаєш! 😊";
pub const START_HINT: &str = "Напишіть /start, щоб почати";
pub const RESTART_HINT: &str = "Напишіть /start, щоб почати знову";
pub const SEARCHING: &str = "🔍 Шукаю ідеальний ресторан для вас...";
pub const NOTHING_FOUND: &str = "Вибачте, не знайшов закладів з потрібними стравами. \
Спробуйте змінити запит або вказати конкретну страву.";

#[derive(Debug, PartialEq, Eq)]
enum Incoming<'a> {
    Start,
    OtherCommand,
    Text(&'a str),
}

/// Commands addressed to another bot (`/start@OtherBot`) are not ours. With an
/// unknown username every addressee is accepted.
fn classify<'a>(text: &'a str, bot_username: Option<&str>) -> Incoming<'a> {
    if !text.starts_with('/') {
        return Incoming::Text(text);
    }
    // "/start", "/start@SomeBot", "/start payload"
    let word = text[1..].split_whitespace().next().unwrap_or("");
    let (command, addressee) = match word.split_once('@') {
        Some((command, addressee)) => (command, Some(addressee)),
        None => (word, None),
    };

    let for_us = match (addressee, bot_username) {
        (Some(addressee), Some(username)) => addressee.eq_ignore_ascii_case(username),
        _ => true,
    };

    if command == "start" && for_us {
        Incoming::Start
    } else {
        Incoming::OtherCommand
    }
}

/// Renders the HTML card for a recommendation. Sheet values are escaped.
pub fn render_card(rec: &Recommendation) -> String {
    let mut card = format!(
        "🏠 <b>{}</b>\n\n📍 <b>Адреса:</b> {}\n\n📱 <b>Соц-мережі:</b> {}\n\n✨ <b>Атмосфера:</b> {}",
        escape_html(&rec.name),
        escape_html(&rec.address),
        escape_html(&rec.socials),
        escape_html(&rec.vibe),
    );

    if rec.menu_url.starts_with("http") {
        card.push_str(&format!(
            "\n\n📋 <a href='{}'>Переглянути меню</a>",
            escape_html(&rec.menu_url)
        ));
    }

    card
}

pub struct Dialogue<A: ChatApi, C: VenueChooser> {
    chat: A,
    recommender: Recommender<C>,
    sessions: Mutex<HashMap<i64, SessionState>>,
    bot_username: Option<String>,
}

impl<A: ChatApi, C: VenueChooser> Dialogue<A, C> {
    pub fn new(chat: A, recommender: Recommender<C>) -> Self {
        Self {
            chat,
            recommender,
            sessions: Mutex::new(HashMap::new()),
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    pub fn chat(&self) -> &A {
        &self.chat
    }

    pub async fn session(&self, user_id: i64) -> Option<SessionState> {
        self.sessions.lock().await.get(&user_id).copied()
    }

    /// Handles one update; failures go to the error hook and never stop the caller.
    pub async fn dispatch(&self, update: Update) {
        let update_id = update.update_id;
        if let Err(e) = self.handle_update(update).await {
            report_error(update_id, &e);
        }
    }

    pub async fn handle_update(&self, update: Update) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let (Some(text), Some(user)) = (message.text.as_deref(), message.from.as_ref()) else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        match classify(text, self.bot_username.as_deref()) {
            Incoming::Start => self.start(chat_id, user.id).await,
            Incoming::OtherCommand => Ok(()),
            Incoming::Text(request) => self.handle_request(chat_id, user.id, request).await,
        }
    }

    async fn start(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.sessions
            .lock()
            .await
            .insert(user_id, SessionState::AwaitingRequest);

        self.chat.send_text(chat_id, GREETING, false).await?;
        tracing::info!("✅ User {} started a conversation", user_id);
        Ok(())
    }

    async fn handle_request(&self, chat_id: i64, user_id: i64, request: &str) -> Result<()> {
        if self.session(user_id).await.is_none() {
            self.chat.send_text(chat_id, START_HINT, false).await?;
            return Ok(());
        }

        tracing::info!("🔍 User {} asked: {}", user_id, request);

        let progress = self.chat.send_text(chat_id, SEARCHING, false).await?;
        let recommendation = self.recommender.recommend(request).await;

        if let Err(e) = self.chat.delete_message(chat_id, progress.message_id).await {
            tracing::warn!("⚠️ Could not delete the progress message: {}", e);
        }

        match recommendation {
            Some(rec) => self.send_recommendation(chat_id, &rec).await?,
            None => {
                self.chat.send_text(chat_id, NOTHING_FOUND, false).await?;
                tracing::warn!("⚠️ No recommendation for user {}", user_id);
            }
        }

        self.sessions.lock().await.remove(&user_id);
        self.chat.send_text(chat_id, RESTART_HINT, false).await?;
        Ok(())
    }

    async fn send_recommendation(&self, chat_id: i64, rec: &Recommendation) -> Result<()> {
        let card = render_card(rec);

        if !rec.photo.starts_with("http") {
            self.chat.send_text(chat_id, &card, true).await?;
            tracing::info!("✅ Sent text recommendation: {}", rec.name);
            return Ok(());
        }

        tracing::info!("📸 Sending photo: {}", rec.photo);
        match self.chat.send_photo(chat_id, &rec.photo, &card).await {
            Ok(_) => {
                tracing::info!("✅ Sent recommendation with photo: {}", rec.name);
            }
            Err(e) => {
                tracing::warn!("⚠️ Photo could not be sent ({}): {}", rec.photo, e);
                let with_link = format!(
                    "{}\n\n📸 <a href='{}'>Переглянути фото ресторану</a>",
                    card,
                    escape_html(&rec.photo)
                );
                self.chat.send_text(chat_id, &with_link, true).await?;
                tracing::info!("✅ Sent recommendation with a photo link: {}", rec.name);
            }
        }
        Ok(())
    }
}

fn report_error(update_id: i64, error: &BotError) {
    tracing::error!(
        "❌ Failed to handle update {}: {} (Category: {:?})",
        update_id,
        error,
        error.category()
    );
}
