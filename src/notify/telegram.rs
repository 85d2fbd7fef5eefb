//! Telegram operator channel.
//!
//! Sends plain-text messages via the Bot API `sendMessage` method.
//! Delivery is best-effort from the caller's perspective; this client just
//! reports failures honestly and lets `notify::best_effort` swallow them.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use super::Notifier;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Telegram Bot API notifier.
pub struct TelegramNotifier {
    http: Client,
    bot_token: SecretString,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: SecretString, chat_id: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            http,
            bot_token,
            chat_id,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let url = format!(
            "{API_BASE}/bot{}/sendMessage",
            self.bot_token.expose_secret(),
        );

        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: message,
        };

        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Telegram sendMessage request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Telegram API returned {status}: {body}"));
        }

        debug!(chat_id = %self.chat_id, "Telegram notification sent");
        Ok(())
    }
}
