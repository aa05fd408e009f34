//! Validated runtime settings.
//!
//! [`Settings`] is built once from the parsed [`Cli`] and passed by reference
//! to everything that needs it; nothing reads the environment after startup.

use crate::cli::Cli;
use crate::error::{CuratorError, Result};
use chrono::{Datelike, Local};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct Settings {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub telegram_error_chat_id: String,
    pub database_path: PathBuf,
    pub url_filter: String,
    pub http_timeout: Duration,
    pub max_attempts: usize,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_error_chat_id", &self.telegram_error_chat_id)
            .field("database_path", &self.database_path)
            .field("url_filter", &self.url_filter)
            .field("http_timeout", &self.http_timeout)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `/<year>/`, the path segment most of the tracked blogs put in article URLs.
pub fn default_url_filter() -> String {
    format!("/{}/", Local::now().year())
}

impl Settings {
    /// Validate the CLI values, collecting every problem into one error.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut problems = Vec::new();

        let token = non_empty(&cli.telegram_bot_token);
        if token.is_none() {
            problems.push("TELEGRAM_BOT_TOKEN is not set");
        }
        let chat_id = non_empty(&cli.telegram_chat_id);
        if chat_id.is_none() {
            problems.push("TELEGRAM_CHAT_ID is not set");
        }
        if cli.database_path.as_os_str().is_empty() {
            problems.push("DATABASE_PATH is empty");
        }
        if cli.retries == 0 {
            problems.push("--retries must be at least 1");
        }
        if cli.timeout_secs == 0 {
            problems.push("--timeout-secs must be at least 1");
        }

        let (Some(telegram_bot_token), Some(telegram_chat_id), true) = (token, chat_id, problems.is_empty())
        else {
            return Err(CuratorError::Config(problems.join("; ")));
        };

        let telegram_error_chat_id =
            non_empty(&cli.telegram_error_chat_id).unwrap_or_else(|| telegram_chat_id.clone());

        Ok(Self {
            telegram_bot_token,
            telegram_chat_id,
            telegram_error_chat_id,
            database_path: cli.database_path.clone(),
            url_filter: non_empty(&cli.url_filter).unwrap_or_else(default_url_filter),
            http_timeout: Duration::from_secs(cli.timeout_secs),
            max_attempts: cli.retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["news_curator"];
        argv.extend_from_slice(args);
        argv.push("run");
        Cli::parse_from(argv)
    }

    #[test]
    fn test_error_chat_defaults_to_post_chat() {
        let cli = parse(&["--telegram-bot-token", "t", "--telegram-chat-id", "@news"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.telegram_error_chat_id, "@news");
        assert_eq!(settings.url_filter, default_url_filter());
        assert_eq!(settings.http_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_attempts, 3);
    }

    #[test]
    fn test_explicit_values_win() {
        let cli = parse(&[
            "--telegram-bot-token",
            "t",
            "--telegram-chat-id",
            "@news",
            "--telegram-error-chat-id",
            "@ops",
            "--url-filter",
            "/blog/",
        ]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.telegram_error_chat_id, "@ops");
        assert_eq!(settings.url_filter, "/blog/");
    }

    #[test]
    fn test_missing_values_are_all_reported() {
        let cli = parse(&["--telegram-bot-token", " ", "--retries", "0"]);
        let err = Settings::from_cli(&cli).unwrap_err().to_string();
        assert!(err.contains("TELEGRAM_BOT_TOKEN"));
        assert!(err.contains("TELEGRAM_CHAT_ID"));
        assert!(err.contains("--retries"));
    }

    #[test]
    fn test_debug_hides_token() {
        let cli = parse(&["--telegram-bot-token", "secret-token", "--telegram-chat-id", "@news"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert!(!format!("{settings:?}").contains("secret-token"));
    }
}
