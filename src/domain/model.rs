use crate::utils::links::convert_drive_url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the catalog sheet, keyed by the header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub data: HashMap<String, String>,
}

impl Venue {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// The default applies only when the column is missing; an empty cell stays empty.
    pub fn field_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.field(key).unwrap_or(default)
    }

    pub fn name(&self) -> &str {
        self.field_or("name", "")
    }
}

/// What the user gets back: a venue with every card field resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub address: String,
    pub socials: String,
    pub vibe: String,
    pub aim: String,
    pub cuisine: String,
    pub menu: String,
    pub menu_url: String,
    pub photo: String,
}

impl From<&Venue> for Recommendation {
    fn from(venue: &Venue) -> Self {
        let photo = venue.field_or("photo", "");
        Self {
            name: venue.field_or("name", "Ресторан").to_string(),
            address: venue.field_or("address", "Адреса не вказана").to_string(),
            socials: venue.field_or("socials", "Соц-мережі не вказані").to_string(),
            vibe: venue.field_or("vibe", "Приємна атмосфера").to_string(),
            aim: venue.field_or("aim", "Для будь-яких подій").to_string(),
            cuisine: venue.field_or("cuisine", "Смачна кухня").to_string(),
            menu: venue.field_or("menu", "").to_string(),
            menu_url: venue.field_or("menu_url", "").to_string(),
            photo: if photo.is_empty() {
                String::new()
            } else {
                convert_drive_url(photo)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingRequest,
}

// Telegram Bot API wire types (only the fields this bot reads)

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub username: Option<String>,
}
