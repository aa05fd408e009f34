//! Command-line interface definitions for News Curator.
//!
//! All connection settings can come from flags, environment variables or a
//! `.env` file (loaded by `main` before parsing). They are global, so they
//! may be given before or after the subcommand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Curator bot.
///
/// # Examples
///
/// ```sh
/// # Run today's job once
/// TELEGRAM_BOT_TOKEN=... TELEGRAM_CHAT_ID=@channel news_curator run
///
/// # Re-run Saturday's roundup by hand
/// news_curator run --weekday 5
///
/// # Long-running scheduler, news at 08:00 and monitoring at 12:00
/// news_curator schedule --news-hour 8 --monitor-hour 12
///
/// # Container health probe (exit code 0 or 1)
/// news_curator health
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true, global = true)]
    pub telegram_bot_token: Option<String>,

    /// Channel or chat the posts go to
    #[arg(long, env = "TELEGRAM_CHAT_ID", global = true)]
    pub telegram_chat_id: Option<String>,

    /// Chat for operator alerts (defaults to the post chat)
    #[arg(long, env = "TELEGRAM_ERROR_CHAT_ID", global = true)]
    pub telegram_error_chat_id: Option<String>,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "news.db", global = true)]
    pub database_path: PathBuf,

    /// Only links containing this substring are treated as articles (defaults to `/<current year>/`)
    #[arg(long, env = "NEWS_CURATOR_URL_FILTER", global = true)]
    pub url_filter: Option<String>,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, env = "NEWS_CURATOR_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Attempts per page fetch before giving up
    #[arg(long, env = "NEWS_CURATOR_RETRIES", default_value_t = 3, global = true)]
    pub retries: usize,

    /// Also append logs to `<dir>/app.log`
    #[arg(long, env = "NEWS_CURATOR_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Crawl, store and publish for today (or the given weekday)
    Run {
        /// Weekday index to run as, 0 = Monday .. 6 = Sunday
        #[arg(long)]
        weekday: Option<u32>,
    },
    /// Check settings and database access without touching the network
    Health,
    /// Alert when no new article has been stored for too long
    Monitor {
        #[arg(long, default_value_t = 3)]
        max_days_without_news: i64,
    },
    /// Run the daily job and the monitoring check on a local-time schedule
    Schedule {
        /// Local hour of the daily job
        #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u32).range(0..24))]
        news_hour: u32,

        /// Local hour of the monitoring check
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(0..24))]
        monitor_hour: u32,

        #[arg(long, default_value_t = 3)]
        max_days_without_news: i64,
    },
    /// Print the most recently stored articles as JSON
    Recent {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Include the full article text
        #[arg(long)]
        with_content: bool,
    },
    /// Score the most recently stored articles again as one batch
    Rescore {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_curator",
            "--telegram-bot-token",
            "123:abc",
            "--telegram-chat-id",
            "@channel",
            "run",
        ]);

        assert_eq!(cli.telegram_bot_token.as_deref(), Some("123:abc"));
        assert_eq!(cli.telegram_chat_id.as_deref(), Some("@channel"));
        assert_eq!(cli.database_path, PathBuf::from("news.db"));
        assert_eq!(cli.timeout_secs, 10);
        assert_eq!(cli.retries, 3);
        assert_eq!(cli.command, Command::Run { weekday: None });
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "news_curator",
            "run",
            "--weekday",
            "6",
            "--database-path",
            "/tmp/news.db",
            "--url-filter",
            "/2024/",
        ]);

        assert_eq!(cli.command, Command::Run { weekday: Some(6) });
        assert_eq!(cli.database_path, PathBuf::from("/tmp/news.db"));
        assert_eq!(cli.url_filter.as_deref(), Some("/2024/"));
    }

    #[test]
    fn test_schedule_defaults_and_hour_range() {
        let cli = Cli::parse_from(["news_curator", "schedule"]);
        assert_eq!(
            cli.command,
            Command::Schedule {
                news_hour: 9,
                monitor_hour: 10,
                max_days_without_news: 3
            }
        );

        assert!(Cli::try_parse_from(["news_curator", "schedule", "--news-hour", "24"]).is_err());
    }

    #[test]
    fn test_store_commands_need_no_telegram_settings() {
        let cli = Cli::parse_from(["news_curator", "recent", "-l", "3", "--with-content"]);
        assert_eq!(
            cli.command,
            Command::Recent {
                limit: 3,
                with_content: true
            }
        );

        let cli = Cli::parse_from(["news_curator", "rescore"]);
        assert_eq!(cli.command, Command::Rescore { limit: 50 });
    }

    #[test]
    fn test_monitor_threshold() {
        let cli = Cli::parse_from(["news_curator", "monitor", "--max-days-without-news", "5"]);
        assert_eq!(
            cli.command,
            Command::Monitor {
                max_days_without_news: 5
            }
        );
    }
}
