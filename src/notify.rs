//! Publishing posts and raising operator alerts.
//!
//! [`Notifier`] wraps a [`Messenger`] with the two chats the bot knows about:
//! the public channel and the error chat. Delivery problems never propagate;
//! they are logged, alerted where possible, and reported as `None`.

use crate::format::{TELEGRAM_MAX_LEN, escape_html, split_chunks, truncate_message};
use crate::telegram::Messenger;
use tracing::{error, info, instrument};

/// Cap on the escaped alert text, safely below the message limit.
const ALERT_MAX_LEN: usize = 4000;
const ALERT_PREFIX: &str = "[ERROR][news-curator]";

#[derive(Debug)]
pub struct Notifier<M> {
    messenger: M,
    chat_id: String,
    error_chat_id: String,
}

impl<M: Messenger> Notifier<M> {
    pub fn new(messenger: M, chat_id: impl Into<String>, error_chat_id: impl Into<String>) -> Self {
        Self {
            messenger,
            chat_id: chat_id.into(),
            error_chat_id: error_chat_id.into(),
        }
    }

    #[cfg(test)]
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Send a post to the channel, returning the id of the last chunk sent.
    #[instrument(level = "info", skip_all)]
    pub async fn publish(&self, text: &str) -> Option<String> {
        let text = truncate_message(text, TELEGRAM_MAX_LEN);
        let mut last_id = None;
        for part in split_chunks(&text, TELEGRAM_MAX_LEN) {
            match self.messenger.send_message(&self.chat_id, part).await {
                Ok(id) => last_id = Some(id),
                Err(e) => {
                    self.report(&format!("Failed to send message to Telegram: {e}"))
                        .await;
                    return None;
                }
            }
        }
        last_id
    }

    /// Send an out-of-band alert to the error chat.
    ///
    /// A failure here is only logged; alerts never trigger further alerts.
    pub async fn alert(&self, message: &str) {
        let text = escape_capped(&format!("{ALERT_PREFIX} {message}"), ALERT_MAX_LEN);
        match self.messenger.send_message(&self.error_chat_id, &text).await {
            Ok(_) => info!("Alert delivered"),
            Err(e) => error!(error = %e, "Failed to deliver alert to Telegram"),
        }
    }

    /// Log at error level and raise an alert.
    pub async fn report(&self, message: &str) {
        error!("{message}");
        self.alert(message).await;
    }
}

/// HTML-escape `text`, stopping before the escaped form would exceed `max`
/// characters. Entities are never cut in half.
fn escape_capped(text: &str, max: usize) -> String {
    let mut out = String::new();
    let mut len = 0;
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let piece = escape_html(c.encode_utf8(&mut buf));
        let piece_len = piece.chars().count();
        if len + piece_len > max {
            break;
        }
        len += piece_len;
        out.push_str(&piece);
    }
    out
}
