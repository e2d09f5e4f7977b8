//! Polling sensors that hold a run back until an external precondition holds

use crate::core::error::PipelineError;
use crate::core::task::{RunContext, TaskAction};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl SensorPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        SensorPolicy { interval, timeout }
    }

    /// Upper bound on predicate evaluations: `ceil(timeout / interval)`, at least one.
    pub fn max_checks(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let checks = self.timeout.as_nanos().div_ceil(self.interval.as_nanos());
        u32::try_from(checks).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for SensorPolicy {
    fn default() -> Self {
        SensorPolicy::new(Duration::from_secs(5), Duration::from_secs(20))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready { checks: u32 },
    TimedOut { checks: u32 },
}

/// A side-effecting precondition check.
#[async_trait]
pub trait Probe: Send + Sync {
    fn describe(&self) -> String;

    async fn check(&self) -> Result<bool>;
}

/// Evaluates `probe` every `policy.interval` until it passes or `policy.timeout` elapses.
///
/// A probe error counts as "not ready yet". A check still pending at the deadline is abandoned.
pub async fn poll<P: Probe + ?Sized>(probe: &P, policy: &SensorPolicy) -> PollOutcome {
    let max_checks = policy.max_checks();
    // None when the timeout is too large to represent; the check count still bounds the loop.
    let deadline = Instant::now().checked_add(policy.timeout);
    let mut checks = 0;

    loop {
        checks += 1;
        let checked = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, probe.check()).await {
                Ok(checked) => checked,
                Err(_) => {
                    debug!(probe = %probe.describe(), checks, "Check still pending at deadline");
                    return PollOutcome::TimedOut { checks };
                }
            },
            None => probe.check().await,
        };
        match checked {
            Ok(true) => return PollOutcome::Ready { checks },
            Ok(false) => debug!(probe = %probe.describe(), checks, "Precondition not met"),
            Err(e) => debug!(probe = %probe.describe(), checks, error = %e, "Probe failed"),
        }

        let next_check = Instant::now().checked_add(policy.interval);
        let past_deadline = match (next_check, deadline) {
            (Some(next), Some(deadline)) => next > deadline,
            (None, _) => true,
            (Some(_), None) => false,
        };
        if checks >= max_checks || past_deadline {
            return PollOutcome::TimedOut { checks };
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Passes once a file exists at `path`.
pub struct FileProbe {
    path: PathBuf,
}

impl FileProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileProbe { path: path.into() }
    }
}

#[async_trait]
impl Probe for FileProbe {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn check(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }
}

/// Task action wrapping a probe; fails with `SensorTimeout` when the poll gives up.
pub struct Sensor {
    name: String,
    probe: Box<dyn Probe>,
    policy: SensorPolicy,
}

impl Sensor {
    pub fn new(name: &str, probe: Box<dyn Probe>, policy: SensorPolicy) -> Self {
        Sensor {
            name: name.to_string(),
            probe,
            policy,
        }
    }
}

#[async_trait]
impl TaskAction for Sensor {
    async fn execute(&self, _ctx: &RunContext) -> Result<(), PipelineError> {
        match poll(self.probe.as_ref(), &self.policy).await {
            PollOutcome::Ready { checks } => {
                info!(sensor = %self.name, checks, "Precondition satisfied");
                Ok(())
            }
            PollOutcome::TimedOut { checks } => Err(PipelineError::SensorTimeout {
                sensor: self.name.clone(),
                checks,
                timeout: self.policy.timeout,
            }),
        }
    }
}
