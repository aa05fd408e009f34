//! Operational checks: store freshness and the container health probe.

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::Result;
use crate::notify::Notifier;
use crate::store::ArticleStore;
use crate::telegram::Messenger;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::{error, info, instrument, warn};

/// Outcome of one freshness check.
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// The store has no rows at all.
    Empty,
    /// The newest row has no timestamp.
    MissingTimestamp,
    /// The newest row's timestamp could not be read.
    Unparseable(String),
    /// The newest article is older than the threshold.
    Stale { days: i64 },
    Fresh { days: i64 },
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC.
pub fn parse_fetched_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

/// Classify the newest stored article against `max_days_without_news`.
pub fn check_freshness(
    store: &ArticleStore,
    max_days_without_news: i64,
    now: DateTime<Utc>,
) -> Result<Freshness> {
    let freshness = match store.latest_fetched_at()? {
        None => Freshness::Empty,
        Some(None) => Freshness::MissingTimestamp,
        Some(Some(raw)) => match parse_fetched_at(&raw) {
            None => Freshness::Unparseable(raw),
            Some(last) => {
                let age = now - last;
                let days = age.num_days();
                if age > Duration::days(max_days_without_news) {
                    Freshness::Stale { days }
                } else {
                    Freshness::Fresh { days }
                }
            }
        },
    };
    Ok(freshness)
}

/// Check freshness and alert the operators when the curator looks stuck.
#[instrument(level = "info", skip(store, notifier))]
pub async fn run_monitoring<M: Messenger>(
    store: &ArticleStore,
    notifier: &Notifier<M>,
    max_days_without_news: i64,
) -> Result<Freshness> {
    let freshness = check_freshness(store, max_days_without_news, Utc::now())?;
    match &freshness {
        Freshness::Empty => {
            notifier
                .report("Monitoring: the store has no records yet; the curator may not be running.")
                .await;
        }
        Freshness::MissingTimestamp => {
            warn!("Monitoring: the newest article has no fetched_at timestamp");
        }
        Freshness::Unparseable(raw) => {
            warn!(%raw, "Monitoring: could not parse the newest fetched_at timestamp");
        }
        Freshness::Stale { days } => {
            notifier
                .report(&format!(
                    "Monitoring: no new articles for {days} days (threshold {max_days_without_news})."
                ))
                .await;
        }
        Freshness::Fresh { days } => {
            info!(days, "Monitoring: news are fresh");
        }
    }
    Ok(freshness)
}

/// Health probe: settings present and the database answers `SELECT 1`.
///
/// Makes no network calls. Every problem is logged, none is alerted.
pub fn health_check(cli: &Cli) -> bool {
    let settings_ok = match Settings::from_cli(cli) {
        Ok(_) => true,
        Err(e) => {
            error!(error = %e, "Health check: settings are incomplete");
            false
        }
    };

    let db_ok = match ArticleStore::open(&cli.database_path).and_then(|store| store.ping()) {
        Ok(()) => true,
        Err(e) => {
            error!(path = %cli.database_path.display(), error = %e, "Health check: database is not reachable");
            false
        }
    };

    if settings_ok && db_ok {
        info!("Health check: OK");
        true
    } else {
        error!("Health check: FAILED");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::notifier;
    use chrono::SecondsFormat;
    use clap::Parser;
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, ArticleStore) {
        let dir = tempdir().unwrap();
        let store = ArticleStore::open(dir.path().join("news.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_parse_fetched_at_variants() {
        let aware = parse_fetched_at("2025-03-01T10:00:00+03:00").unwrap();
        assert_eq!(aware.to_rfc3339_opts(SecondsFormat::Secs, true), "2025-03-01T07:00:00Z");

        let naive = parse_fetched_at("2025-03-01T10:00:00.123456").unwrap();
        assert_eq!(naive.to_rfc3339_opts(SecondsFormat::Secs, true), "2025-03-01T10:00:00Z");

        assert!(parse_fetched_at("2025-03-01T10:00:00").is_some());
        assert!(parse_fetched_at("yesterday").is_none());
    }

    #[tokio::test]
    async fn test_empty_store_alerts() {
        let (_dir, store) = store();
        let notifier = notifier();

        let result = run_monitoring(&store, &notifier, 3).await.unwrap();
        assert_eq!(result, Freshness::Empty);
        let alerts = notifier.messenger().sent_to("errors");
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("no records"));
    }

    #[tokio::test]
    async fn test_stale_store_alerts() {
        let (_dir, store) = store();
        let old = (Utc::now() - Duration::days(10)).to_rfc3339();
        store.insert_raw("https://example.com/old", 1.0, Some(old.as_str())).unwrap();
        let notifier = notifier();

        let result = run_monitoring(&store, &notifier, 3).await.unwrap();
        assert_eq!(result, Freshness::Stale { days: 10 });
        assert!(notifier.messenger().sent_to("errors")[0].contains("no new articles for 10 days"));
    }

    #[tokio::test]
    async fn test_fresh_naive_timestamp_does_not_alert() {
        let (_dir, store) = store();
        let fresh = (Utc::now() - Duration::days(1)).naive_utc().to_string().replace(' ', "T");
        store.insert_raw("https://example.com/fresh", 1.0, Some(fresh.as_str())).unwrap();
        let notifier = notifier();

        let result = run_monitoring(&store, &notifier, 3).await.unwrap();
        assert_eq!(result, Freshness::Fresh { days: 1 });
        assert!(notifier.messenger().sent_to("errors").is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_bad_timestamps_only_warn() {
        let (_dir, store) = store();
        store.insert_raw("https://example.com/null", 1.0, None).unwrap();
        let notifier = notifier();

        assert_eq!(
            run_monitoring(&store, &notifier, 3).await.unwrap(),
            Freshness::MissingTimestamp
        );

        store.insert_raw("https://example.com/bad", 1.0, Some("not-a-date")).unwrap();
        assert_eq!(
            run_monitoring(&store, &notifier, 3).await.unwrap(),
            Freshness::Unparseable("not-a-date".to_string())
        );
        assert!(notifier.messenger().sent_to("errors").is_empty());
    }

    #[test]
    fn test_health_check() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("news.db");
        let db = db.to_str().unwrap();

        let ok = Cli::parse_from([
            "news_curator",
            "--telegram-bot-token",
            "t",
            "--telegram-chat-id",
            "@news",
            "--database-path",
            db,
            "health",
        ]);
        assert!(health_check(&ok));

        let missing = Cli::parse_from([
            "news_curator",
            "--telegram-bot-token",
            "",
            "--telegram-chat-id",
            "",
            "--database-path",
            db,
            "health",
        ]);
        assert!(!health_check(&missing));

        let bad_db = Cli::parse_from([
            "news_curator",
            "--telegram-bot-token",
            "t",
            "--telegram-chat-id",
            "@news",
            "--database-path",
            dir.path().to_str().unwrap(),
            "health",
        ]);
        assert!(!health_check(&bad_db));
    }
}
