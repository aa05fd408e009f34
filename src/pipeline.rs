//! Link collection and ingestion of new articles.
//!
//! The pipeline runs strictly in order:
//!
//! 1. **Collect**: pull every link from each site of the day's plan
//! 2. **Filter**: keep links containing the plan's URL substring
//! 3. **Dedup**: skip links already in the store, before any fetch
//! 4. **Extract**: fetch text, split title and summary, classify the source
//! 5. **Score**: one TF-IDF call over the whole batch
//! 6. **Persist**: idempotent insert of every scored article
//!
//! A failing site or article is logged and skipped; only store errors abort.

use crate::catalog::guess_source_from_url;
use crate::error::Result;
use crate::models::NewArticle;
use crate::notify::Notifier;
use crate::pages::PageSource;
use crate::scoring::compute_tfidf_scores;
use crate::store::ArticleStore;
use crate::telegram::Messenger;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument};

const TITLE_MAX_CHARS: usize = 200;
const SUMMARY_MAX_CHARS: usize = 600;

/// Keep only the links that contain `substring`. No globbing, no regex.
pub fn filter_link_by_substring<S: AsRef<str>>(links: &[S], substring: &str) -> Vec<String> {
    links
        .iter()
        .map(AsRef::as_ref)
        .filter(|link| link.contains(substring))
        .map(str::to_string)
        .collect()
}

/// First non-empty line as the title, the next up to three lines as the summary.
///
/// Returns `None` when the text has no non-empty line at all.
pub fn split_title_and_summary(content: &str) -> Option<(String, String)> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    let title: String = lines.next()?.chars().take(TITLE_MAX_CHARS).collect();
    let summary: String = lines
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SUMMARY_MAX_CHARS)
        .collect();
    Some((title, summary))
}

pub struct Pipeline<'a, P, M> {
    pages: &'a P,
    store: &'a ArticleStore,
    notifier: &'a Notifier<M>,
}

impl<'a, P: PageSource, M: Messenger> Pipeline<'a, P, M> {
    pub fn new(pages: &'a P, store: &'a ArticleStore, notifier: &'a Notifier<M>) -> Self {
        Self {
            pages,
            store,
            notifier,
        }
    }

    /// Links from every site, in site order then document order.
    ///
    /// A site that fails is reported through the alert channel and skipped.
    #[instrument(level = "info", skip_all, fields(sites = sites.len()))]
    pub async fn collect_links<S: AsRef<str>>(&self, sites: &[S]) -> Vec<String> {
        let all_links: Vec<String> = stream::iter(sites.iter().map(AsRef::as_ref))
            .then(|site| async move {
                match self.pages.extract_links(site).await {
                    Ok(links) => {
                        info!(%site, count = links.len(), "Collected links");
                        links
                    }
                    Err(e) => {
                        self.notifier
                            .report(&format!("Failed to collect links from {site}: {e}"))
                            .await;
                        Vec::new()
                    }
                }
            })
            .concat()
            .await;

        info!(count = all_links.len(), "Link collection finished");
        all_links
    }

    /// Store up to `max_new_articles` articles not seen before and return
    /// their URLs in link order.
    #[instrument(level = "info", skip_all, fields(links = links.len(), %url_filter, max_new_articles))]
    pub async fn ingest(
        &self,
        links: &[String],
        url_filter: &str,
        max_new_articles: usize,
    ) -> Result<Vec<String>> {
        let filtered = filter_link_by_substring(links, url_filter);
        info!(count = filtered.len(), "Links left after URL filter");

        let mut batch: Vec<NewArticle> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for url in filtered {
            if batch.len() >= max_new_articles {
                debug!("Fetch cap reached");
                break;
            }
            // Index pages often link the same article more than once.
            if !seen.insert(url.clone()) {
                continue;
            }
            if self.store.exists(&url)? {
                debug!(%url, "Already stored; skipping");
                continue;
            }

            let content = match self.pages.fetch_text(&url).await {
                Ok(Some(content)) => content,
                Ok(None) => {
                    debug!(%url, "Page has no text; skipping");
                    continue;
                }
                Err(e) => {
                    error!(%url, error = %e, "Failed to parse article; skipping");
                    continue;
                }
            };
            let Some((title, summary)) = split_title_and_summary(&content) else {
                continue;
            };

            let source = guess_source_from_url(&url).to_string();
            batch.push(NewArticle {
                url,
                title,
                summary,
                content,
                source,
            });
        }

        if batch.is_empty() {
            info!("No new articles to store");
            return Ok(Vec::new());
        }

        let texts: Vec<String> = batch.iter().map(NewArticle::scoring_text).collect();
        let scores = compute_tfidf_scores(&texts);

        for (article, score) in batch.iter().zip(scores) {
            self.store.insert_if_absent(article, score)?;
            info!(url = %article.url, score = format!("{score:.3}"), "Stored article");
        }

        Ok(batch.into_iter().map(|a| a.url).collect())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page source shared by the module tests.

    use super::*;
    use crate::error::CuratorError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct FakePages {
        /// site -> links; a missing site fails.
        pub links: HashMap<String, Vec<String>>,
        /// url -> text; a missing url fails, `None` is an empty page.
        pub texts: HashMap<String, Option<String>>,
        pub fetched: Mutex<Vec<String>>,
    }

    impl FakePages {
        pub fn with_text(mut self, url: &str, text: Option<&str>) -> Self {
            self.texts.insert(url.to_string(), text.map(str::to_string));
            self
        }

        pub fn with_links(mut self, site: &str, links: &[&str]) -> Self {
            self.links
                .insert(site.to_string(), links.iter().map(|l| l.to_string()).collect());
            self
        }

        pub fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl PageSource for FakePages {
        async fn extract_links(&self, url: &str) -> Result<Vec<String>> {
            self.links
                .get(url)
                .cloned()
                .ok_or_else(|| CuratorError::HttpStatus {
                    url: url.to_string(),
                    status: 500,
                })
        }

        async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.texts.get(url).cloned().ok_or_else(|| CuratorError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
