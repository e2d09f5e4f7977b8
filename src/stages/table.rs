use crate::core::config::TableConfig;
use crate::core::error::PipelineError;
use crate::core::task::{RunContext, TaskAction};
use crate::stages::CommandRunner;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const STAGE: &str = "table_registration";

/// Ensures the external table over the storage location exists; a no-op when it already does.
pub struct TableRegistration {
    runner: Arc<dyn CommandRunner>,
    config: TableConfig,
    location: String,
}

impl TableRegistration {
    pub fn new(runner: Arc<dyn CommandRunner>, config: TableConfig, location: &str) -> Self {
        TableRegistration {
            runner,
            config,
            location: location.to_string(),
        }
    }

    pub fn ddl(&self) -> String {
        let mut columns = vec![
            "base STRING".to_string(),
            "last_update DATE".to_string(),
        ];
        columns.extend(
            self.config
                .pairs
                .iter()
                .map(|pair| format!("{} DOUBLE", pair.to_lowercase())),
        );

        format!(
            "CREATE EXTERNAL TABLE IF NOT EXISTS {}(\n    {}\n)\nROW FORMAT DELIMITED\nFIELDS TERMINATED BY '{}'\nSTORED AS TEXTFILE\nLOCATION '{}'",
            self.config.name,
            columns.join(",\n    "),
            self.config.delimiter,
            self.location
        )
    }
}

#[async_trait]
impl TaskAction for TableRegistration {
    async fn execute(&self, _ctx: &RunContext) -> Result<(), PipelineError> {
        let ddl = self.ddl();
        debug!(%ddl, "Registering table");
        self.runner
            .run(STAGE, &self.config.program, &["-e".to_string(), ddl])
            .await?;
        info!(table = %self.config.name, "Table registered");
        Ok(())
    }
}
