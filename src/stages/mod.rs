//! Adapters invoking the external systems downstream of ingestion

pub mod batch;
pub mod bulk_copy;
pub mod notify;
pub mod table;

use crate::core::error::PipelineError;
use async_trait::async_trait;
use tracing::debug;

pub use batch::BatchSubmit;
pub use bulk_copy::BulkCopy;
pub use notify::{LogNotifier, Notifier, NotifyStage, SlackWebhookNotifier};
pub use table::TableRegistration;

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// `stage` names the caller in failures.
    async fn run(&self, stage: &str, program: &str, args: &[String]) -> Result<(), PipelineError>;
}

/// Spawns real processes with `tokio::process`.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, stage: &str, program: &str, args: &[String]) -> Result<(), PipelineError> {
        debug!(stage, program, ?args, "Running command");
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| PipelineError::adapter(stage, format!("failed to start {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::adapter(
                stage,
                format!("{program} exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_process_runner_success_and_failure() {
        let runner = ProcessRunner;
        assert!(runner.run("test", "true", &[]).await.is_ok());

        let err = runner.run("test", "false", &[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::AdapterFailure { ref stage, .. } if stage == "test"));
    }

    #[tokio::test]
    async fn test_process_runner_missing_program() {
        let err = ProcessRunner
            .run("test", "fxflow-no-such-program", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }
}
