//! The daily job: plan, collect, ingest, publish.
//!
//! [`Curator`] owns everything one run needs. The page source and the
//! messenger are generic so the whole job can run against in-memory fakes.

use crate::catalog::{PublicationMode, content_plan, day_tags_for_index, weekday_from_index};
use crate::config::Settings;
use crate::error::Result;
use crate::monitor::{Freshness, run_monitoring};
use crate::notify::Notifier;
use crate::pages::PageSource;
use crate::pipeline::Pipeline;
use crate::planner::{MAX_TO_PUBLISH, Planner};
use crate::store::ArticleStore;
use crate::telegram::Messenger;
use chrono::{Datelike, Local, Utc};
use std::time::Instant;
use tracing::{info, instrument, warn};

pub struct Curator<P, M> {
    url_filter: String,
    store: ArticleStore,
    pages: P,
    notifier: Notifier<M>,
}

impl<P: PageSource, M: Messenger> Curator<P, M> {
    pub fn new(settings: &Settings, store: ArticleStore, pages: P, messenger: M) -> Self {
        Self {
            url_filter: settings.url_filter.clone(),
            store,
            pages,
            notifier: Notifier::new(
                messenger,
                settings.telegram_chat_id.clone(),
                settings.telegram_error_chat_id.clone(),
            ),
        }
    }

    pub fn notifier(&self) -> &Notifier<M> {
        &self.notifier
    }

    /// Run the job for the current local weekday.
    pub async fn run_for_today(&self) -> Result<()> {
        self.run_for_weekday(Local::now().weekday().num_days_from_monday())
            .await
    }

    /// Run the job as if it were weekday `index` (0 = Monday).
    ///
    /// An index without a plan is logged and skipped.
    #[instrument(level = "info", skip(self))]
    pub async fn run_for_weekday(&self, index: u32) -> Result<()> {
        let Some(day) = weekday_from_index(index) else {
            warn!(index, "No content plan for this weekday index; skipping run");
            return Ok(());
        };
        let start_time = Instant::now();
        let plan = content_plan(day, &self.url_filter);
        let mode = PublicationMode::for_weekday(day);
        info!(%day, ?mode, sites = plan.sites.len(), cap = plan.max_new_articles, "Starting curation run");

        let pipeline = Pipeline::new(&self.pages, &self.store, &self.notifier);
        let links = pipeline.collect_links(&plan.sites).await;
        let new_urls = pipeline
            .ingest(&links, &plan.url_filter, plan.max_new_articles)
            .await?;

        let planner = Planner::new(&self.store, &self.notifier);
        match mode {
            PublicationMode::DailyTop => {
                planner
                    .publish_top_news(&new_urls, day_tags_for_index(index), MAX_TO_PUBLISH)
                    .await?;
            }
            PublicationMode::ToolsDigest => {
                planner.publish_tools_digest(&new_urls).await?;
            }
            PublicationMode::WeeklyDigest => {
                planner.publish_weekly_digest(Utc::now()).await?;
            }
        }

        let elapsed = start_time.elapsed();
        info!(
            ?elapsed,
            secs = elapsed.as_secs(),
            new_articles = new_urls.len(),
            "Curation run complete"
        );
        Ok(())
    }

    pub async fn run_monitoring(&self, max_days_without_news: i64) -> Result<Freshness> {
        run_monitoring(&self.store, &self.notifier, max_days_without_news).await
    }
}
