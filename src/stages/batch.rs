use crate::core::config::BatchConfig;
use crate::core::error::PipelineError;
use crate::core::task::{RunContext, TaskAction};
use crate::stages::CommandRunner;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const STAGE: &str = "batch_submit";

/// Submits the processing job; success is the job runner's zero exit code.
pub struct BatchSubmit {
    runner: Arc<dyn CommandRunner>,
    config: BatchConfig,
}

impl BatchSubmit {
    pub fn new(runner: Arc<dyn CommandRunner>, config: BatchConfig) -> Self {
        BatchSubmit { runner, config }
    }

    fn args(&self, ctx: &RunContext) -> Vec<String> {
        let mut args = vec!["--name".to_string(), self.config.name.clone()];
        args.extend(self.config.extra_args.iter().cloned());
        args.push(self.config.application.clone());
        args.push(ctx.scheduled_date.to_string());
        args
    }
}

#[async_trait]
impl TaskAction for BatchSubmit {
    async fn execute(&self, ctx: &RunContext) -> Result<(), PipelineError> {
        self.runner
            .run(STAGE, &self.config.program, &self.args(ctx))
            .await?;
        info!(job = %self.config.name, "Batch job completed");
        Ok(())
    }
}
