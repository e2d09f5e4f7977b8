pub mod cli;
pub mod core;
pub mod ingest;
pub mod pipeline;
pub mod providers;
pub mod scheduler;
pub mod stages;
pub mod store;

use crate::core::config::AppConfig;
use crate::pipeline::Pipeline;
use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

pub enum AppCommand {
    /// Run the whole graph once
    Run { date: Option<NaiveDate> },
    /// Run only the download/transform stage
    Fetch { date: Option<NaiveDate> },
    /// Trigger a run every day until interrupted
    Schedule { run_now: bool },
    /// Print the resolved task order
    Graph,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let pipeline = Pipeline::new(config)?;
    execute(command, &pipeline).await
}

/// Runs `command` against an already built pipeline.
pub async fn execute(command: AppCommand, pipeline: &Pipeline) -> Result<()> {
    let today = || Utc::now().date_naive();

    match command {
        AppCommand::Run { date } => {
            let result = pipeline.run_for(date.unwrap_or_else(today)).await;
            println!("{}", cli::ui::render_run(&result));
            if let Some(failed) = result.failed_task() {
                bail!("Run {} failed at task {}", result.run_id, failed.id);
            }
            Ok(())
        }
        AppCommand::Fetch { date } => {
            let path = pipeline.fetch_for(date.unwrap_or_else(today)).await?;
            println!("Rates written to {}", path.display());
            Ok(())
        }
        AppCommand::Schedule { run_now } => {
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received");
                    let _ = shutdown_tx.send(true);
                }
            });
            scheduler::DailySchedule::new(pipeline)
                .run(run_now, shutdown_rx)
                .await;
            Ok(())
        }
        AppCommand::Graph => {
            println!("{}", cli::graph::render_graph(pipeline.executor()));
            Ok(())
        }
    }
}
