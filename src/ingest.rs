//! The download/transform stage: fetch each base currency and materialize its record

use crate::core::currency::load_pair_specs;
use crate::core::error::PipelineError;
use crate::core::rates::{RateSource, project};
use crate::core::task::{RunContext, TaskAction};
use crate::store::OutputLog;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct DownloadRates {
    source: Arc<dyn RateSource>,
    currencies_path: PathBuf,
}

impl DownloadRates {
    pub fn new(source: Arc<dyn RateSource>, currencies_path: impl Into<PathBuf>) -> Self {
        DownloadRates {
            source,
            currencies_path: currencies_path.into(),
        }
    }
}

#[async_trait]
impl TaskAction for DownloadRates {
    #[instrument(name = "DownloadRates", skip(self, ctx), fields(date = %ctx.scheduled_date))]
    async fn execute(&self, ctx: &RunContext) -> Result<(), PipelineError> {
        let specs = load_pair_specs(&self.currencies_path).await?;
        let log = OutputLog::new(&ctx.output_path);
        // The artifact belongs to this run's date; each attempt starts from empty.
        log.reset().await?;

        for spec in &specs {
            let snapshot = self.source.fetch(&spec.base).await?;
            let record = project(spec, &snapshot)?;
            log.append(&record).await?;
            debug!(base = %record.base, pairs = record.rates.len(), "Appended record");
        }

        info!(
            records = specs.len(),
            path = %log.path().display(),
            "Materialized rate records"
        );
        Ok(())
    }
}
