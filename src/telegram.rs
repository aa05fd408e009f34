//! Outbound delivery through the Telegram Bot API.
//!
//! [`Messenger`] is the seam the rest of the crate depends on; [`TelegramBot`]
//! implements it with a plain `sendMessage` call in HTML parse mode. Callers
//! are expected to hand over text that already fits the length limit (see
//! [`crate::notify::Notifier`]).

use crate::error::{CuratorError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Something that can post a text message to a chat.
pub trait Messenger {
    /// Send `text` to `chat_id` and return the new message id.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Bot API client.
pub struct TelegramBot {
    client: Client,
    token: String,
    api_base: String,
}

impl fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramBot")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramBot {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token: token.into(),
            api_base: TELEGRAM_API.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

impl Messenger for TelegramBot {
    #[instrument(level = "info", skip(self, text), fields(chars = text.chars().count()))]
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String> {
        let t0 = Instant::now();
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;
        let body: ApiResponse = response.json().await?;
        let elapsed_ms = t0.elapsed().as_millis();

        match body {
            ApiResponse {
                ok: true,
                result: Some(sent),
                ..
            } => {
                debug!(elapsed_ms, message_id = sent.message_id, "Message delivered");
                Ok(sent.message_id.to_string())
            }
            ApiResponse { description, .. } => {
                let reason = description.unwrap_or_else(|| "unknown error".to_string());
                warn!(elapsed_ms, %reason, "Telegram rejected message");
                Err(CuratorError::Telegram(reason))
            }
        }
    }
}
