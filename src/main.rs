use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxflow::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxflow::AppCommand {
    fn from(cmd: Commands) -> fxflow::AppCommand {
        match cmd {
            Commands::Run { date } => fxflow::AppCommand::Run { date },
            Commands::Fetch { date } => fxflow::AppCommand::Fetch { date },
            Commands::Schedule { now } => fxflow::AppCommand::Schedule { run_now: now },
            Commands::Graph => fxflow::AppCommand::Graph,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the full pipeline once
    Run {
        /// Scheduled date (YYYY-MM-DD), defaults to today in UTC
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Download and transform rates only
    Fetch {
        /// Scheduled date (YYYY-MM-DD), defaults to today in UTC
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Run the pipeline once a day
    Schedule {
        /// Also run immediately for today
        #[arg(long)]
        now: bool,
    },
    /// Display the task graph
    Graph,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxflow::cli::setup::setup(),
        Some(cmd) => fxflow::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
