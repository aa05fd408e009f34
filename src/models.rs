//! Data models for curated articles and their publication views.
//!
//! This module defines the data structures passed between pipeline stages:
//! - [`NewArticle`]: A freshly fetched article waiting to be scored and stored
//! - [`Article`]: A persisted row from the article store
//! - [`DigestItem`]: A trimmed, tagged view of an article used by the digest posts

use serde::Serialize;

/// A freshly fetched article, buffered by the pipeline before scoring.
///
/// Nothing here is persisted until the whole batch has been scored, because
/// the scorer needs every document of the run to compute document frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    /// The article URL; becomes the store's unique key.
    pub url: String,
    /// First non-empty line of the extracted text.
    pub title: String,
    /// The following lines of text, joined and truncated.
    pub summary: String,
    /// The full cleaned text.
    pub content: String,
    /// Source id derived from the URL (see [`crate::catalog::guess_source_from_url`]).
    pub source: String,
}

impl NewArticle {
    /// The text handed to the relevance scorer for this article.
    pub fn scoring_text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.summary, self.content)
    }
}

/// A persisted article as returned by the store.
///
/// `fetched_at` is kept as the raw ISO-8601 string written at insert time;
/// rows written by older versions may lack it or carry a naive timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Unique article URL.
    pub url: String,
    /// Article headline.
    pub title: String,
    /// Short summary of the opening lines.
    pub summary: String,
    /// The full cleaned text.
    pub content: String,
    /// Source id, `"other"` when the URL matched no known site.
    pub source: String,
    /// Relevance score; only comparable with scores from the same batch.
    pub score: f64,
    /// Insert timestamp (ISO-8601, UTC).
    pub fetched_at: Option<String>,
}

/// One entry of the Saturday tools digest or the Sunday weekly digest.
///
/// Built at publication time from an [`Article`] and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestItem {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub score: f64,
    /// Canned "what is this good for" line; only set for the tools digest.
    pub use_case: Option<String>,
    pub source_tag: String,
}
