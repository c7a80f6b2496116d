use crate::core::notifications::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Sends reviewer notifications through the Telegram Bot API.
pub struct TelegramClient {
    client: Client,
    bot_token: String,
    chat_id: String,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        Ok(Self {
            client,
            bot_token,
            chat_id,
            base_url: "https://api.telegram.org".to_string(),
        })
    }

    /// Point the client at a self-hosted Bot API server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            // reqwest errors embed the URL, which contains the bot token.
            .map_err(|e| NotifyError::Delivery(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!(
                "Telegram API error: {} - {}",
                status, text
            )));
        }

        Ok(())
    }
}
