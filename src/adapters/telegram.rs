use crate::domain::model::{ApiResponse, Message, Update, User};
use crate::domain::ports::ChatApi;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Bot API client over plain HTTPS + JSON.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Upper bound for every call except `getUpdates`, which waits out its long-poll window.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        tracing::debug!("Calling Telegram method {}", method);

        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .timeout(timeout.unwrap_or(self.timeout))
            .send()
            .await?;
        let status = response.status();
        let payload: ApiResponse<T> = response.json().await?;

        if !payload.ok {
            return Err(BotError::TelegramError {
                code: payload.error_code.unwrap_or(status.as_u16() as i64),
                description: payload
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        payload.result.ok_or_else(|| BotError::TelegramError {
            code: status.as_u16() as i64,
            description: format!("{} returned ok without a result", method),
        })
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        // The HTTP timeout has to outlast Telegram's long-poll window
        let http_timeout = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", body, Some(http_timeout)).await
    }

    async fn get_me(&self) -> Result<User> {
        self.call("getMe", json!({}), None).await
    }

    async fn drop_pending_updates(&self) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                json!({ "drop_pending_updates": true }),
                None,
            )
            .await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str, html: bool) -> Result<Message> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if html {
            body["parse_mode"] = json!("HTML");
        }
        self.call("sendMessage", body, None).await
    }

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<Message> {
        self.call(
            "sendPhoto",
            json!({
                "chat_id": chat_id,
                "photo": photo_url,
                "caption": caption,
                "parse_mode": "HTML",
            }),
            None,
        )
        .await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat_id, "message_id": message_id }),
                None,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_strips_trailing_slash() {
        let client = TelegramClient::new("http://localhost:9000/", "123:abc");
        assert_eq!(
            client.method_url("getUpdates"),
            "http://localhost:9000/bot123:abc/getUpdates"
        );
    }
}
