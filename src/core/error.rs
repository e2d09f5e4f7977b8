//! Error kinds raised by pipeline tasks

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sensor's precondition never became true.
    #[error("Sensor {sensor} timed out after {checks} checks ({timeout:?})")]
    SensorTimeout {
        sensor: String,
        checks: u32,
        timeout: Duration,
    },

    #[error("Rate source unavailable for {base}: {reason}")]
    SourceUnavailable { base: String, reason: String },

    /// A requested pair is absent from the fetched snapshot.
    #[error("Pair {pair} missing from {base} snapshot")]
    MissingPair { base: String, pair: String },

    #[error("Stage {stage} failed: {reason}")]
    AdapterFailure { stage: String, reason: String },

    #[error("Invalid currency configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn source_unavailable(base: &str, reason: impl ToString) -> Self {
        PipelineError::SourceUnavailable {
            base: base.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn adapter(stage: &str, reason: impl ToString) -> Self {
        PipelineError::AdapterFailure {
            stage: stage.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while assembling a task graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task {0} is defined more than once")]
    DuplicateTask(String),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: String, dependency: String },

    #[error("Cycle detected in task graph involving: {0:?}")]
    CycleDetected(Vec<String>),
}
