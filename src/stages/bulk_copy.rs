use crate::core::config::StorageConfig;
use crate::core::error::PipelineError;
use crate::core::task::{RunContext, TaskAction};
use crate::stages::CommandRunner;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const STAGE: &str = "bulk_copy";

/// Puts the run's output artifact into the distributed filesystem, overwriting any existing copy.
pub struct BulkCopy {
    runner: Arc<dyn CommandRunner>,
    config: StorageConfig,
}

impl BulkCopy {
    pub fn new(runner: Arc<dyn CommandRunner>, config: StorageConfig) -> Self {
        BulkCopy { runner, config }
    }
}

#[async_trait]
impl TaskAction for BulkCopy {
    async fn execute(&self, ctx: &RunContext) -> Result<(), PipelineError> {
        let program = &self.config.program;
        let destination = &self.config.destination;
        let mkdir: Vec<String> = ["dfs", "-mkdir", "-p", destination.as_str()]
            .into_iter()
            .map(String::from)
            .collect();
        self.runner.run(STAGE, program, &mkdir).await?;

        let put = vec![
            "dfs".to_string(),
            "-put".to_string(),
            "-f".to_string(),
            ctx.output_path.display().to_string(),
            destination.clone(),
        ];
        self.runner.run(STAGE, program, &put).await?;

        info!(destination = %destination, "Copied output to storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::RecordingRunner;

    #[tokio::test]
    async fn test_creates_destination_then_puts_file() {
        let runner = Arc::new(RecordingRunner::default());
        let stage = BulkCopy::new(runner.clone(), StorageConfig::default());
        let ctx = RunContext::for_test();

        stage.execute(&ctx).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "hdfs");
        assert_eq!(calls[0].1, vec!["dfs", "-mkdir", "-p", "/forex"]);
        assert_eq!(
            calls[1].1,
            vec![
                "dfs".to_string(),
                "-put".to_string(),
                "-f".to_string(),
                ctx.output_path.display().to_string(),
                "/forex".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_before_put() {
        let runner = Arc::new(RecordingRunner {
            failing: vec!["hdfs".to_string()],
            ..Default::default()
        });
        let stage = BulkCopy::new(runner.clone(), StorageConfig::default());

        let err = stage.execute(&RunContext::for_test()).await.unwrap_err();
        assert!(matches!(err, PipelineError::AdapterFailure { ref stage, .. } if stage == STAGE));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }
}
