//! Long-running scheduler for the daily job and the monitoring check.
//!
//! Both jobs fire once a day at a whole local hour. A failing job is logged
//! and alerted; the loop itself only stops on Ctrl-C.

use crate::curator::Curator;
use crate::pages::PageSource;
use crate::telegram::Messenger;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    DailyNews,
    Monitoring,
}

/// First `hour:00` strictly after `now`.
pub fn next_occurrence(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// The job due next, and when. Ties go to the daily job.
pub fn next_job(now: NaiveDateTime, news_hour: u32, monitor_hour: u32) -> (Job, NaiveDateTime) {
    let news = next_occurrence(now, news_hour);
    let monitor = next_occurrence(now, monitor_hour);
    if monitor < news {
        (Job::Monitoring, monitor)
    } else {
        (Job::DailyNews, news)
    }
}

/// Wall-clock time until a local time, skipping over DST gaps.
fn wait_until(at: NaiveDateTime) -> std::time::Duration {
    let target = Local
        .from_local_datetime(&at)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(at + Duration::hours(1))).earliest());
    target
        .and_then(|t| (t - Local::now()).to_std().ok())
        .unwrap_or_default()
}

/// Run both jobs forever.
pub async fn run_scheduler<P: PageSource, M: Messenger>(
    curator: &Curator<P, M>,
    news_hour: u32,
    monitor_hour: u32,
    max_days_without_news: i64,
) {
    info!(news_hour, monitor_hour, "Scheduler started (local time)");

    loop {
        let (job, at) = next_job(Local::now().naive_local(), news_hour, monitor_hour);
        info!(?job, %at, "Waiting for next job");

        tokio::select! {
            _ = tokio::time::sleep(wait_until(at)) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; scheduler stopping");
                return;
            }
        }

        let outcome = match job {
            Job::DailyNews => curator.run_for_today().await,
            Job::Monitoring => curator.run_monitoring(max_days_without_news).await.map(|_| ()),
        };
        if let Err(e) = outcome {
            curator
                .notifier()
                .report(&format!("Critical error in {job:?} job: {e}"))
                .await;
        }
    }
}
