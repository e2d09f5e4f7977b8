//! Tasks: named units of work with dependencies and a retry policy

use crate::core::config::TaskDefaults;
use crate::core::error::PipelineError;
use crate::core::retry::RetryPolicy;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-run values handed to every task action.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub scheduled_date: NaiveDate,
    /// Where this run's rate records are materialized
    pub output_path: PathBuf,
}

impl RunContext {
    pub fn new(scheduled_date: NaiveDate, output_dir: &Path) -> Self {
        RunContext {
            run_id: format!("{scheduled_date}_{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")),
            scheduled_date,
            output_path: output_dir.join(format!("forex_rates_{scheduled_date}.json")),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test() -> Self {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        RunContext::new(date, &std::env::temp_dir())
    }
}

#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn execute(&self, ctx: &RunContext) -> Result<(), PipelineError>;
}

pub struct Task {
    pub id: String,
    /// Upstream task ids, in declaration order
    pub depends_on: Vec<String>,
    pub retry: RetryPolicy,
    pub owner: String,
    action: Arc<dyn TaskAction>,
}

impl Task {
    pub fn new(id: &str, action: impl TaskAction + 'static, defaults: &TaskDefaults) -> Self {
        Self::from_arc(id, Arc::new(action), defaults)
    }

    pub fn from_arc(id: &str, action: Arc<dyn TaskAction>, defaults: &TaskDefaults) -> Self {
        Task {
            id: id.to_string(),
            depends_on: Vec::new(),
            retry: defaults.retry_policy(),
            owner: defaults.owner.clone(),
            action,
        }
    }

    pub fn after(mut self, upstream: &str) -> Self {
        if !self.depends_on.iter().any(|d| d == upstream) {
            self.depends_on.push(upstream.to_string());
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn action(&self) -> &dyn TaskAction {
        self.action.as_ref()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .field("retry", &self.retry)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
