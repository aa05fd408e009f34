//! Store maintenance: dumping recent rows and re-scoring them.

use crate::error::{CuratorError, Result};
use crate::models::Article;
use crate::scoring::compute_tfidf_scores;
use crate::store::ArticleStore;
use serde::Serialize;
use tracing::{info, instrument};

/// Row view without the full text, for terminal output.
#[derive(Debug, Serialize)]
struct ArticleSummary<'a> {
    url: &'a str,
    title: &'a str,
    source: &'a str,
    score: f64,
    fetched_at: Option<&'a str>,
}

impl<'a> From<&'a Article> for ArticleSummary<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            url: &article.url,
            title: &article.title,
            source: &article.source,
            score: article.score,
            fetched_at: article.fetched_at.as_deref(),
        }
    }
}

/// The newest `limit` rows as pretty-printed JSON, newest first.
pub fn recent_as_json(store: &ArticleStore, limit: usize, with_content: bool) -> Result<String> {
    let rows = store.last_articles(limit)?;
    let json = if with_content {
        serde_json::to_string_pretty(&rows)
    } else {
        let summaries: Vec<ArticleSummary<'_>> = rows.iter().map(ArticleSummary::from).collect();
        serde_json::to_string_pretty(&summaries)
    };
    json.map_err(|e| CuratorError::Parse(e.to_string()))
}

/// Score the newest `limit` rows again as a single batch.
///
/// Scores are only comparable within a batch, so this puts articles from
/// different runs on one scale. Returns how many rows were updated.
#[instrument(level = "info", skip(store))]
pub fn rescore_recent(store: &ArticleStore, limit: usize) -> Result<usize> {
    let rows = store.last_articles(limit)?;
    let texts: Vec<String> = rows
        .iter()
        .map(|a| format!("{}\n{}\n{}", a.title, a.summary, a.content))
        .collect();
    let scores = compute_tfidf_scores(&texts);

    let mut updated = 0;
    for (article, score) in rows.iter().zip(scores) {
        if store.update_score(&article.url, score)? {
            updated += 1;
        }
    }
    info!(updated, "Re-scored recent articles");
    Ok(updated)
}
