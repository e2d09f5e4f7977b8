//! Task orchestration and rate ingestion building blocks

pub mod config;
pub mod currency;
pub mod error;
pub mod executor;
pub mod graph;
pub mod log;
pub mod rates;
pub mod retry;
pub mod sensor;
pub mod task;

// Re-export main types for cleaner imports
pub use currency::CurrencyPairSpec;
pub use error::{GraphError, PipelineError};
pub use executor::{Executor, RunResult, RunStatus, TaskReport, TaskState};
pub use graph::TaskGraph;
pub use rates::{RateRecord, RateSnapshot, RateSource};
pub use retry::RetryPolicy;
pub use sensor::{PollOutcome, Probe, SensorPolicy};
pub use task::{RunContext, Task, TaskAction};
