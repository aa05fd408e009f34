//! SQLite-backed article store.
//!
//! The store keeps a single `news` table keyed by a unique `url`. Each
//! operation opens its own connection and closes it on return; nothing is
//! held open across a run, so correctness only relies on idempotent inserts
//! and read-your-writes.
//!
//! # Schema
//!
//! ```text
//! news(id INTEGER PRIMARY KEY, url TEXT UNIQUE, title TEXT, summary TEXT,
//!      content TEXT, source TEXT, score REAL, fetched_at TEXT)
//! ```
//!
//! `fetched_at` is an RFC 3339 UTC timestamp written at insert time. Tables
//! created by older versions are migrated in place by adding any missing
//! column.

use crate::error::Result;
use crate::models::{Article, NewArticle};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const COLUMNS: &[(&str, &str)] = &[
    ("url", "TEXT"),
    ("title", "TEXT"),
    ("summary", "TEXT"),
    ("content", "TEXT"),
    ("source", "TEXT"),
    ("score", "REAL"),
    ("fetched_at", "TEXT"),
];

const SELECT_ARTICLE: &str = "SELECT url, title, summary, content, source, score, fetched_at FROM news";

#[derive(Debug, Clone)]
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    /// Open (creating or migrating if needed) the store at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.init_schema()?;
        info!("Article store ready");
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT,
                title TEXT,
                summary TEXT,
                content TEXT,
                source TEXT,
                score REAL,
                fetched_at TEXT
            );
            "#,
        )?;

        let existing: HashSet<String> = {
            let mut stmt = conn.prepare("PRAGMA table_info(news)")?;
            let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
            names.collect::<rusqlite::Result<_>>()?
        };
        for (name, kind) in COLUMNS {
            if !existing.contains(*name) {
                info!(column = name, "Adding missing column to news table");
                conn.execute(&format!("ALTER TABLE news ADD COLUMN {name} {kind}"), [])?;
            }
        }

        // Older tables had no unique constraint; keep the first row per URL.
        let removed = conn.execute(
            r#"DELETE FROM news
               WHERE url IS NOT NULL
                 AND id NOT IN (SELECT MIN(id) FROM news WHERE url IS NOT NULL GROUP BY url)"#,
            [],
        )?;
        if removed > 0 {
            warn!(removed, "Removed duplicate URL rows before indexing");
        }

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_news_url ON news(url)",
            [],
        )?;
        Ok(())
    }

    fn row_to_article(row: &Row) -> rusqlite::Result<Article> {
        Ok(Article {
            url: row.get(0)?,
            title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            summary: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            content: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            source: row
                .get::<_, Option<String>>(4)?
                .unwrap_or_else(|| "other".to_string()),
            score: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
            fetched_at: row.get(6)?,
        })
    }

    /// Connectivity probe used by the health check.
    pub fn ping(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn exists(&self, url: &str) -> Result<bool> {
        let conn = self.connect()?;
        let found = conn
            .query_row("SELECT 1 FROM news WHERE url = ? LIMIT 1", params![url], |_| {
                Ok(())
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert an article unless its URL is already stored.
    ///
    /// Returns `true` when a row was written. A duplicate URL is not an error.
    pub fn insert_if_absent(&self, article: &NewArticle, score: f64) -> Result<bool> {
        let conn = self.connect()?;
        let fetched_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let written = conn.execute(
            r#"INSERT OR IGNORE INTO news (url, title, summary, content, source, score, fetched_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                article.url,
                article.title,
                article.summary,
                article.content,
                article.source,
                score,
                fetched_at,
            ],
        )?;
        debug!(url = %article.url, written, "insert_if_absent");
        Ok(written > 0)
    }

    /// Overwrite the score of a stored article. Returns `false` for unknown URLs.
    pub fn update_score(&self, url: &str, score: f64) -> Result<bool> {
        let conn = self.connect()?;
        let updated = conn.execute("UPDATE news SET score = ? WHERE url = ?", params![score, url])?;
        Ok(updated > 0)
    }

    /// Rows for the given URLs, in no particular order.
    pub fn query_by_urls(&self, urls: &[String]) -> Result<Vec<Article>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; urls.len()].join(",");
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_ARTICLE} WHERE url IN ({placeholders})"))?;
        let rows = stmt.query_map(params_from_iter(urls.iter()), Self::row_to_article)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Best articles fetched at or after `since`: score desc, then newest first.
    pub fn query_top_by_score(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Article>> {
        let since = since.to_rfc3339_opts(SecondsFormat::Micros, true);
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_ARTICLE} WHERE fetched_at >= ? ORDER BY score DESC, fetched_at DESC LIMIT ?"
        ))?;
        let rows = stmt.query_map(params![since, limit as i64], Self::row_to_article)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// `fetched_at` of the most recently inserted row.
    ///
    /// The outer `None` means the table is empty, the inner one a row that
    /// never had a timestamp.
    pub fn latest_fetched_at(&self) -> Result<Option<Option<String>>> {
        let conn = self.connect()?;
        let latest = conn
            .query_row(
                "SELECT fetched_at FROM news ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(latest)
    }

    /// Most recently inserted articles, newest first.
    pub fn last_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_ARTICLE} ORDER BY id DESC LIMIT ?"))?;
        let rows = stmt.query_map(params![limit as i64], Self::row_to_article)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Raw insert used by tests to plant rows with arbitrary timestamps.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, url: &str, score: f64, fetched_at: Option<&str>) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"INSERT INTO news (url, title, summary, content, source, score, fetched_at)
               VALUES (?, 'title', 'summary', 'content', 'other', ?, ?)"#,
            params![url, score, fetched_at],
        )?;
        Ok(())
    }
}
