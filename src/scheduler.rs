//! Once-a-day trigger for the pipeline

use crate::core::executor::RunResult;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// The first UTC midnight strictly after `now`, with the date it opens.
pub fn next_trigger(now: DateTime<Utc>) -> (NaiveDate, DateTime<Utc>) {
    let today = now.date_naive();
    let next = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (next, next.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Where to look for the next trigger after the one at `fired` has run.
///
/// Never earlier than `fired`, so a wake-up ahead of wall-clock midnight cannot
/// repeat a date. Never earlier than `now`, so days spent inside a long run are skipped.
fn resume_from(fired: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    fired.max(now)
}

/// Work started once per scheduled date.
#[async_trait]
pub trait DailyJob: Send + Sync {
    async fn run_for(&self, date: NaiveDate) -> RunResult;
}

#[async_trait]
impl DailyJob for Pipeline {
    async fn run_for(&self, date: NaiveDate) -> RunResult {
        Pipeline::run_for(self, date).await
    }
}

/// Runs a job once per calendar day. Missed days are not caught up.
pub struct DailySchedule<'a> {
    job: &'a dyn DailyJob,
}

impl<'a> DailySchedule<'a> {
    pub fn new(job: &'a dyn DailyJob) -> Self {
        DailySchedule { job }
    }

    /// Loops until `shutdown` flips to true. With `run_now`, today's run starts immediately.
    pub async fn run(&self, run_now: bool, mut shutdown: watch::Receiver<bool>) {
        let mut cursor = Utc::now();
        if run_now {
            self.trigger(cursor.date_naive()).await;
        }

        loop {
            let (date, at) = next_trigger(cursor);
            let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            info!(%date, "Next run in {:?}", wait);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.trigger(date).await;
                    cursor = resume_from(at, Utc::now());
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }

    // Awaited inline, so a run never overlaps the next trigger.
    async fn trigger(&self, date: NaiveDate) {
        let result = self.job.run_for(date).await;
        if result.is_success() {
            info!(%date, run = %result.run_id, "Scheduled run succeeded");
        } else {
            error!(%date, run = %result.run_id, "Scheduled run failed");
        }
    }
}
