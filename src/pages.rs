//! Page fetching: link extraction and visible-text extraction.
//!
//! The pipeline only talks to the [`PageSource`] trait, so tests swap in an
//! in-memory source. [`HttpPageSource`] is the real implementation: every
//! request has a fixed timeout, non-2xx responses count as failures, and
//! failures are retried through [`with_retry`] before being returned as a
//! terminal error for that one URL.

use crate::error::Result;
use crate::retry::{Backoff, status_error, with_retry};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const USER_AGENT: &str = concat!("news_curator/", env!("CARGO_PKG_VERSION"));

/// Elements whose text never counts as body text; the title is handled separately.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "title"];

/// Something that can turn a URL into links or text.
pub trait PageSource {
    /// All `<a href>` targets on the page, as absolute URLs, in document order.
    async fn extract_links(&self, url: &str) -> Result<Vec<String>>;

    /// The page's visible text, one trimmed line per text run, or `None` when
    /// the page has no text at all.
    async fn fetch_text(&self, url: &str) -> Result<Option<String>>;
}

/// [`PageSource`] backed by `reqwest`.
#[derive(Debug)]
pub struct HttpPageSource {
    client: Client,
    max_attempts: usize,
    backoff: Box<dyn Backoff>,
}

impl HttpPageSource {
    pub fn new(timeout: Duration, max_attempts: usize, backoff: Box<dyn Backoff>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            max_attempts,
            backoff,
        })
    }

    /// GET a page body, retrying transient failures.
    async fn get_html(&self, url: &str) -> Result<String> {
        with_retry(url, self.max_attempts, self.backoff.as_ref(), || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(url, status.as_u16()));
            }
            Ok(response.text().await?)
        })
        .await
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "info", skip(self))]
    async fn extract_links(&self, url: &str) -> Result<Vec<String>> {
        let base = Url::parse(url)?;
        let html = self.get_html(url).await?;
        let links = links_from_html(&base, &html);
        debug!(count = links.len(), "Extracted links");
        Ok(links)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
        let html = self.get_html(url).await?;
        let text = text_from_html(&html);
        info!(bytes = text.as_ref().map_or(0, String::len), "Parsed page text");
        Ok(text)
    }
}

/// Resolve every `<a href>` on the page against `base`.
///
/// `#fragment` hrefs become `base#fragment`; hrefs that cannot be joined are
/// dropped.
pub fn links_from_html(base: &Url, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").expect("valid anchor selector");

    document
        .select(&anchor)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|resolved| resolved.to_string())
        .collect()
}

/// Visible text of an HTML document.
///
/// The `<title>` is put on the first line unless the body already starts
/// with it. Script, style and noscript contents are dropped, as are blank
/// lines.
pub fn text_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").expect("valid title selector");

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut lines: Vec<String> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_noise = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
        });
        if in_noise {
            continue;
        }
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    if !title.is_empty() && lines.first() != Some(&title) {
        lines.insert(0, title);
    }

    let cleaned = lines.join("\n");
    (!cleaned.is_empty()).then_some(cleaned)
}
