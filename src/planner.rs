//! Turning stored articles into posts.
//!
//! Each weekday has exactly one publication mode (see
//! [`PublicationMode`](crate::catalog::PublicationMode)):
//!
//! - Monday to Friday: the top five new articles, one post each
//! - Saturday: one roundup post of the top five new tools
//! - Sunday: one digest post of the week's best stored articles
//!
//! The planner only reads the store; it never writes articles.

use crate::catalog::{
    DIGEST_FALLBACK_TAG, DayTags, TOOLS_FALLBACK_TAG, source_tag, tool_use_case,
};
use crate::error::Result;
use crate::format::{format_news_message, format_tools_digest_message, format_weekly_digest_message};
use crate::models::{Article, DigestItem};
use crate::notify::Notifier;
use crate::store::ArticleStore;
use crate::telegram::Messenger;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

/// Posts per weekday run.
pub const MAX_TO_PUBLISH: usize = 5;
/// Items in the Saturday roundup.
pub const MAX_TOOLS: usize = 5;
pub const WEEKLY_DAYS_BACK: i64 = 7;
pub const WEEKLY_LIMIT: usize = 8;

/// Sort by score, best first. Ties keep their store order.
fn sort_by_score_desc(rows: &mut [Article]) {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
}

fn clip(text: &str, max: usize, fallback: &str) -> String {
    let text = text.trim();
    let text = if text.is_empty() { fallback } else { text };
    text.chars().take(max).collect()
}

pub struct Planner<'a, M> {
    store: &'a ArticleStore,
    notifier: &'a Notifier<M>,
}

impl<'a, M: Messenger> Planner<'a, M> {
    pub fn new(store: &'a ArticleStore, notifier: &'a Notifier<M>) -> Self {
        Self { store, notifier }
    }

    /// Publish the best of today's new articles, one post each.
    ///
    /// Returns how many posts were handed to the messenger.
    #[instrument(level = "info", skip_all, fields(new_urls = new_urls.len(), topic = tags.topic_tag))]
    pub async fn publish_top_news(
        &self,
        new_urls: &[String],
        tags: DayTags,
        max_to_publish: usize,
    ) -> Result<usize> {
        if new_urls.is_empty() {
            info!("No new articles; nothing to publish");
            return Ok(0);
        }

        let mut rows = self.store.query_by_urls(new_urls)?;
        if rows.is_empty() {
            warn!("Store returned no rows for the new URLs");
            return Ok(0);
        }
        sort_by_score_desc(&mut rows);

        let mut published = 0;
        for article in rows.iter().take(max_to_publish) {
            let tag = source_tag(&article.source, tags.source_tag);
            let msg = format_news_message(&article.url, &article.content, tags.topic_tag, tag);
            self.notifier.publish(&msg).await;
            published += 1;
            info!(url = %article.url, score = format!("{:.3}", article.score), "Published article");
        }
        Ok(published)
    }

    /// Top tools among today's new articles, ready for the roundup post.
    pub fn build_tools_digest_items(
        &self,
        new_urls: &[String],
        max_tools: usize,
    ) -> Result<Vec<DigestItem>> {
        if new_urls.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows = self.store.query_by_urls(new_urls)?;
        if rows.is_empty() {
            warn!(urls = new_urls.len(), "Store returned no rows for the new URLs");
            return Ok(Vec::new());
        }
        sort_by_score_desc(&mut rows);

        Ok(rows
            .into_iter()
            .take(max_tools)
            .map(|article| DigestItem {
                title: clip(&article.title, 120, "New tool"),
                summary: clip(&article.summary, 250, ""),
                score: article.score,
                use_case: Some(tool_use_case(&article.source).to_string()),
                source_tag: source_tag(&article.source, TOOLS_FALLBACK_TAG).to_string(),
                url: article.url,
            })
            .collect())
    }

    /// Best stored articles fetched within the last `days_back` days.
    pub fn build_weekly_digest_items(
        &self,
        now: DateTime<Utc>,
        days_back: i64,
        limit: usize,
    ) -> Result<Vec<DigestItem>> {
        let since = now - Duration::days(days_back);
        let rows = self.store.query_top_by_score(since, limit)?;

        Ok(rows
            .into_iter()
            .map(|article| DigestItem {
                title: clip(&article.title, 140, "Event of the week"),
                summary: clip(&article.summary, 260, ""),
                score: article.score,
                use_case: None,
                source_tag: source_tag(&article.source, DIGEST_FALLBACK_TAG).to_string(),
                url: article.url,
            })
            .collect())
    }

    /// Send the Saturday roundup. Nothing is sent when there are no tools.
    #[instrument(level = "info", skip_all, fields(new_urls = new_urls.len()))]
    pub async fn publish_tools_digest(&self, new_urls: &[String]) -> Result<bool> {
        let tools = self.build_tools_digest_items(new_urls, MAX_TOOLS)?;
        if tools.is_empty() {
            info!("No new tools for the Saturday roundup");
            return Ok(false);
        }
        self.notifier
            .publish(&format_tools_digest_message(&tools))
            .await;
        info!(count = tools.len(), "Saturday tools roundup published");
        Ok(true)
    }

    /// Send the Sunday digest, including the quiet-week post when the
    /// window is empty.
    #[instrument(level = "info", skip_all)]
    pub async fn publish_weekly_digest(&self, now: DateTime<Utc>) -> Result<()> {
        let events = self.build_weekly_digest_items(now, WEEKLY_DAYS_BACK, WEEKLY_LIMIT)?;
        self.notifier
            .publish(&format_weekly_digest_message(&events))
            .await;
        info!(count = events.len(), "Weekly digest published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::day_tags;
    use crate::models::NewArticle;
    use crate::notify::testing::notifier;
    use chrono::{SecondsFormat, Weekday};
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, ArticleStore) {
        let dir = tempdir().unwrap();
        let store = ArticleStore::open(dir.path().join("news.db")).unwrap();
        (dir, store)
    }

    fn put(store: &ArticleStore, url: &str, source: &str, score: f64) -> String {
        let article = NewArticle {
            url: url.to_string(),
            title: format!("Title of {url}"),
            summary: "A summary".to_string(),
            content: format!("Headline for {url}\nBody text"),
            source: source.to_string(),
        };
        store.insert_if_absent(&article, score).unwrap();
        url.to_string()
    }

    #[tokio::test]
    async fn test_top_news_publishes_best_five_in_order() {
        let (_dir, store) = store();
        let urls: Vec<String> = (0..7)
            .map(|i| put(&store, &format!("https://x.com/2025/{i}"), "other", i as f64))
            .collect();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        let count = planner
            .publish_top_news(&urls, day_tags(Weekday::Tue), MAX_TO_PUBLISH)
            .await
            .unwrap();

        assert_eq!(count, 5);
        let posts = notifier.messenger().sent_to("channel");
        assert_eq!(posts.len(), 5);
        assert!(posts[0].contains("https://x.com/2025/6"));
        assert!(posts[4].contains("https://x.com/2025/2"));
        // Unknown sources fall back to the day's source tag.
        assert!(posts[0].ends_with("#ITNews #Python #Development"));
    }

    #[tokio::test]
    async fn test_top_news_without_new_urls_sends_nothing() {
        let (_dir, store) = store();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        let count = planner
            .publish_top_news(&[], day_tags(Weekday::Mon), MAX_TO_PUBLISH)
            .await
            .unwrap();
        assert_eq!(count, 0);

        let unknown = vec!["https://nowhere.com/2025/x".to_string()];
        let count = planner
            .publish_top_news(&unknown, day_tags(Weekday::Mon), MAX_TO_PUBLISH)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(notifier.messenger().sent_to("channel").is_empty());
    }

    #[tokio::test]
    async fn test_openai_source_is_tagged_ai_everywhere() {
        let (_dir, store) = store();
        let url = put(&store, "https://openai.com/2025/gpt", "openai", 3.0);
        let urls = vec![url];
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        // Weekday post on a Thursday still tags the source #AI.
        planner
            .publish_top_news(&urls, day_tags(Weekday::Thu), MAX_TO_PUBLISH)
            .await
            .unwrap();
        assert!(notifier.messenger().sent_to("channel")[0].ends_with("#ITNews #Security #AI"));

        let tools = planner.build_tools_digest_items(&urls, MAX_TOOLS).unwrap();
        assert_eq!(tools[0].source_tag, "#AI");

        let weekly = planner
            .build_weekly_digest_items(Utc::now(), WEEKLY_DAYS_BACK, WEEKLY_LIMIT)
            .unwrap();
        assert_eq!(weekly[0].source_tag, "#AI");
    }

    #[tokio::test]
    async fn test_tools_digest_items_are_clipped_and_tagged() {
        let (_dir, store) = store();
        let long = NewArticle {
            url: "https://github.blog/2025/long".to_string(),
            title: "t".repeat(300),
            summary: format!("  {}  ", "s".repeat(400)),
            content: "c".to_string(),
            source: "github_blog".to_string(),
        };
        store.insert_if_absent(&long, 2.0).unwrap();
        let blank = NewArticle {
            url: "https://misc.dev/2025/x".to_string(),
            title: String::new(),
            summary: String::new(),
            content: "c".to_string(),
            source: "other".to_string(),
        };
        store.insert_if_absent(&blank, 1.0).unwrap();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        let items = planner
            .build_tools_digest_items(&[long.url.clone(), blank.url.clone()], MAX_TOOLS)
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.chars().count(), 120);
        assert_eq!(items[0].summary.chars().count(), 250);
        assert_eq!(items[0].source_tag, "#DevTools");
        assert!(items[0].use_case.as_deref().unwrap().contains("GitHub"));
        assert_eq!(items[1].title, "New tool");
        assert_eq!(items[1].source_tag, TOOLS_FALLBACK_TAG);
    }

    #[tokio::test]
    async fn test_saturday_with_nothing_new_sends_nothing() {
        let (_dir, store) = store();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        assert!(!planner.publish_tools_digest(&[]).await.unwrap());
        assert!(notifier.messenger().sent_to("channel").is_empty());
    }

    #[tokio::test]
    async fn test_tools_digest_with_unknown_urls_sends_nothing() {
        let (_dir, store) = store();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);
        let urls = vec!["https://github.blog/2025/never-stored".to_string()];

        assert!(planner.build_tools_digest_items(&urls, MAX_TOOLS).unwrap().is_empty());
        assert!(!planner.publish_tools_digest(&urls).await.unwrap());
        assert!(notifier.messenger().sent_to("channel").is_empty());
    }

    #[tokio::test]
    async fn test_weekly_digest_uses_stored_window() {
        let (_dir, store) = store();
        let now = Utc::now();
        let ts = |days: i64| (now - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Micros, true);
        store.insert_raw("https://a.com/2025/fresh", 2.0, Some(ts(2).as_str())).unwrap();
        store.insert_raw("https://a.com/2025/stale", 9.0, Some(ts(30).as_str())).unwrap();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        let items = planner
            .build_weekly_digest_items(now, WEEKLY_DAYS_BACK, WEEKLY_LIMIT)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://a.com/2025/fresh");
        assert_eq!(items[0].source_tag, DIGEST_FALLBACK_TAG);

        planner.publish_weekly_digest(now).await.unwrap();
        let posts = notifier.messenger().sent_to("channel");
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("https://a.com/2025/fresh"));
    }

    #[tokio::test]
    async fn test_quiet_week_still_posts() {
        let (_dir, store) = store();
        let notifier = notifier();
        let planner = Planner::new(&store, &notifier);

        planner.publish_weekly_digest(Utc::now()).await.unwrap();
        let posts = notifier.messenger().sent_to("channel");
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("Hardly any big news"));
    }
}
