//! # News Curator
//!
//! A scheduled curation bot for tech news. Every day it crawls a fixed list
//! of blogs picked by weekday, keeps the articles it has not seen before,
//! scores them with keyword-weighted TF-IDF, stores them in SQLite and
//! publishes the best ones to a Telegram channel.
//!
//! ## Features
//!
//! - Weekday topic plan: AI, Python, data engineering, security, dev tools
//! - Saturday roundup of developer tools, Sunday digest of the whole week
//! - Idempotent storage keyed by URL; known articles are never fetched twice
//! - Operator alerts to a separate Telegram chat, freshness monitoring and a
//!   network-free health probe for containers
//!
//! ## Usage
//!
//! ```sh
//! news_curator run                 # today's job, once
//! news_curator schedule            # daily job at 09:00, monitoring at 10:00
//! news_curator monitor             # freshness check, once
//! news_curator health              # exit code 0 or 1
//! news_curator recent --limit 5    # newest stored rows as JSON
//! ```
//!
//! ## Architecture
//!
//! One run is strictly sequential:
//! 1. **Plan**: pick the day's sites, URL filter and cap
//! 2. **Collect**: extract links from every site
//! 3. **Ingest**: filter, dedup, fetch, score, persist
//! 4. **Publish**: top posts, tools roundup or weekly digest

use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod catalog;
mod cli;
mod config;
mod curator;
mod error;
mod format;
mod inspect;
mod models;
mod monitor;
mod notify;
mod pages;
mod pipeline;
mod planner;
mod retry;
mod schedule;
mod scoring;
mod store;
mod telegram;

use cli::{Cli, Command};
use config::Settings;
use curator::Curator;
use pages::HttpPageSource;
use retry::FixedBackoff;
use store::ArticleStore;
use telegram::TelegramBot;

const LOG_FILE: &str = "app.log";

/// Console logging on stderr (stdout is reserved for command output), plus an appending file log when `log_dir` is given.
///
/// A log file that cannot be opened is reported and skipped.
fn init_tracing(log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_error = None;
    let file_layer = log_dir.and_then(|dir| {
        let opened = std::fs::create_dir_all(dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
        });
        match opened {
            Ok(file) => Some(
                tfmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                file_error = Some((dir.to_path_buf(), e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    if let Some((dir, e)) = file_error {
        error!(dir = %dir.display(), error = %e, "Cannot open log file; logging to the console only");
    }
}

fn build_curator(cli: &Cli) -> Result<Curator<HttpPageSource, TelegramBot>, error::CuratorError> {
    let settings = Settings::from_cli(cli)?;
    debug!(?settings, "Loaded settings");

    let store = ArticleStore::open(&settings.database_path)?;
    let pages = HttpPageSource::new(
        settings.http_timeout,
        settings.max_attempts,
        Box::new(FixedBackoff::new(Duration::from_secs(1))),
    )?;
    let bot = TelegramBot::new(settings.telegram_bot_token.clone(), settings.http_timeout)?;
    Ok(Curator::new(&settings, store, pages, bot))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    init_tracing(args.log_dir.as_deref());
    info!(command = ?args.command, "news_curator starting up");

    match args.command {
        Command::Health => {
            if !monitor::health_check(&args) {
                std::process::exit(1);
            }
        }
        Command::Run { weekday } => {
            let curator = build_curator(&args)?;
            let outcome = match weekday {
                Some(index) => curator.run_for_weekday(index).await,
                None => curator.run_for_today().await,
            };
            if let Err(e) = outcome {
                curator
                    .notifier()
                    .report(&format!("Critical error in the daily job: {e}"))
                    .await;
                return Err(e.into());
            }
        }
        Command::Monitor {
            max_days_without_news,
        } => {
            let curator = build_curator(&args)?;
            let freshness = curator.run_monitoring(max_days_without_news).await?;
            info!(?freshness, "Monitoring finished");
        }
        Command::Schedule {
            news_hour,
            monitor_hour,
            max_days_without_news,
        } => {
            let curator = build_curator(&args)?;
            schedule::run_scheduler(&curator, news_hour, monitor_hour, max_days_without_news)
                .await;
        }
        Command::Recent {
            limit,
            with_content,
        } => {
            let store = ArticleStore::open(&args.database_path)?;
            println!("{}", inspect::recent_as_json(&store, limit, with_content)?);
        }
        Command::Rescore { limit } => {
            let store = ArticleStore::open(&args.database_path)?;
            inspect::rescore_recent(&store, limit)?;
        }
    }

    Ok(())
}
