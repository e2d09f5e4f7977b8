//! Wires the daily forex graph from configuration

use crate::core::config::AppConfig;
use crate::core::error::{GraphError, PipelineError};
use crate::core::executor::{Executor, RunResult};
use crate::core::graph::TaskGraph;
use crate::core::rates::RateSource;
use crate::core::sensor::{FileProbe, Probe, Sensor};
use crate::core::task::{RunContext, Task, TaskAction};
use crate::ingest::DownloadRates;
use crate::providers::availability::HttpProbe;
use crate::providers::forex_api::ForexApiSource;
use crate::stages::notify::failure_message;
use crate::stages::{
    BatchSubmit, BulkCopy, CommandRunner, LogNotifier, Notifier, NotifyStage, SlackWebhookNotifier,
    TableRegistration,
};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const REMOTE_AVAILABILITY: &str = "is_forex_rates_available";
pub const LOCAL_AVAILABILITY: &str = "is_forex_currencies_file_available";
pub const DOWNLOAD_RATES: &str = "download_rates";
pub const BULK_COPY: &str = "bulk_copy";
pub const TABLE_REGISTRATION: &str = "create_forex_table";
pub const BATCH_SUBMIT: &str = "forex_processing";
pub const NOTIFY: &str = "notify";

/// External systems the pipeline talks to.
pub struct Collaborators {
    pub source: Arc<dyn RateSource>,
    pub remote_probe: Box<dyn Probe>,
    pub runner: Arc<dyn CommandRunner>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    pub fn from_config(config: &AppConfig) -> Self {
        let notifier: Arc<dyn Notifier> = match &config.notify.webhook_url {
            Some(url) => Arc::new(SlackWebhookNotifier::new(url, &config.notify.channel)),
            None => Arc::new(LogNotifier),
        };

        Collaborators {
            source: Arc::new(
                ForexApiSource::new(&config.source.base_url, config.source.endpoints.clone())
                    .with_timeout(config.source.request_timeout()),
            ),
            remote_probe: Box::new(
                HttpProbe::new(
                    &config.source.availability_endpoint,
                    &config.source.availability_marker,
                )
                .with_timeout(config.source.request_timeout()),
            ),
            runner: Arc::new(crate::stages::ProcessRunner),
            notifier,
        }
    }
}

fn step(id: &'static str, action: impl TaskAction + 'static) -> (&'static str, Arc<dyn TaskAction>) {
    (id, Arc::new(action))
}

pub struct Pipeline {
    config: AppConfig,
    executor: Executor,
    source: Arc<dyn RateSource>,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self, GraphError> {
        let collaborators = Collaborators::from_config(&config);
        Self::with_collaborators(config, collaborators)
    }

    pub fn with_collaborators(config: AppConfig, c: Collaborators) -> Result<Self, GraphError> {
        let sensor_policy = config.sensors.policy();
        let steps = vec![
            step(
                REMOTE_AVAILABILITY,
                Sensor::new(REMOTE_AVAILABILITY, c.remote_probe, sensor_policy),
            ),
            step(
                LOCAL_AVAILABILITY,
                Sensor::new(
                    LOCAL_AVAILABILITY,
                    Box::new(FileProbe::new(&config.files.currencies_path)),
                    sensor_policy,
                ),
            ),
            step(
                DOWNLOAD_RATES,
                DownloadRates::new(Arc::clone(&c.source), &config.files.currencies_path),
            ),
            step(
                BULK_COPY,
                BulkCopy::new(Arc::clone(&c.runner), config.storage.clone()),
            ),
            step(
                TABLE_REGISTRATION,
                TableRegistration::new(
                    Arc::clone(&c.runner),
                    config.table.clone(),
                    &config.storage.destination,
                ),
            ),
            step(
                BATCH_SUBMIT,
                BatchSubmit::new(Arc::clone(&c.runner), config.batch.clone()),
            ),
            step(NOTIFY, NotifyStage::new(Arc::clone(&c.notifier))),
        ];

        // A single chain: each step depends on the one before it.
        let mut graph = TaskGraph::new("forex_data_pipeline");
        let mut previous: Option<&str> = None;
        for (id, action) in steps {
            let mut task = Task::from_arc(id, action, &config.defaults)
                .with_retry(config.retry_policy_for(id));
            if let Some(upstream) = previous {
                task = task.after(upstream);
            }
            graph.add_task(task)?;
            previous = Some(id);
        }

        Ok(Pipeline {
            executor: Executor::new(graph)?,
            source: c.source,
            notifier: c.notifier,
            config,
        })
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn context_for(&self, date: NaiveDate) -> RunContext {
        RunContext::new(date, &self.config.files.output_dir)
    }

    /// Runs the whole graph for one scheduled date.
    pub async fn run_for(&self, date: NaiveDate) -> RunResult {
        let ctx = self.context_for(date);
        let result = self.executor.run(&ctx).await;

        if !result.is_success() && self.config.notify.on_failure {
            let message = failure_message(&result, &self.config.defaults);
            if let Err(e) = self.notifier.send(&message).await {
                warn!(error = %e, "Failed to send failure notification");
            }
        }
        result
    }

    /// Runs only the download/transform stage, once, without sensors or retries.
    pub async fn fetch_for(&self, date: NaiveDate) -> Result<PathBuf, PipelineError> {
        let ctx = self.context_for(date);
        DownloadRates::new(Arc::clone(&self.source), &self.config.files.currencies_path)
            .execute(&ctx)
            .await?;
        info!(path = %ctx.output_path.display(), "Fetched rates");
        Ok(ctx.output_path)
    }
}
