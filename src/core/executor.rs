//! Runs a task graph once per trigger, honoring dependencies and retry policies

use crate::core::error::GraphError;
use crate::core::graph::TaskGraph;
use crate::core::retry::with_retry;
use crate::core::task::{RunContext, Task};
use chrono::NaiveDate;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Success,
    Failed { error: String },
    /// Never started because an upstream task did not succeed
    Skipped { blocked_by: String },
}

impl Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Success => write!(f, "success"),
            TaskState::Failed { .. } => write!(f, "failed"),
            TaskState::Skipped { .. } => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub id: String,
    pub state: TaskState,
    /// Zero for skipped tasks
    pub attempts: u32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: String,
    pub scheduled_date: NaiveDate,
    pub status: RunStatus,
    /// One report per task, in execution order
    pub tasks: Vec<TaskReport>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn report(&self, id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The task whose failure ended the run, if any.
    pub fn failed_task(&self) -> Option<&TaskReport> {
        self.tasks
            .iter()
            .find(|t| matches!(t.state, TaskState::Failed { .. }))
    }
}

pub struct Executor {
    graph: TaskGraph,
    order: Vec<usize>,
    /// Serializes runs of this graph: a later trigger waits for the prior run
    run_lock: Mutex<()>,
}

impl Executor {
    pub fn new(graph: TaskGraph) -> Result<Self, GraphError> {
        let order = graph.resolve()?;
        Ok(Executor {
            graph,
            order,
            run_lock: Mutex::new(()),
        })
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Tasks in the order they will be executed.
    pub fn ordered_tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().map(|&i| &self.graph.tasks()[i])
    }

    #[instrument(name = "GraphRun", skip(self, ctx), fields(graph = %self.graph.name(), run = %ctx.run_id))]
    pub async fn run(&self, ctx: &RunContext) -> RunResult {
        let _guard = self.run_lock.lock().await;
        info!(date = %ctx.scheduled_date, "Starting run");

        let mut reports: Vec<TaskReport> = Vec::with_capacity(self.order.len());
        for task in self.ordered_tasks() {
            let blocked_by = task.depends_on.iter().find(|dep| {
                !reports
                    .iter()
                    .any(|r| &r.id == *dep && r.state == TaskState::Success)
            });

            if let Some(dep) = blocked_by {
                debug!(task = %task.id, upstream = %dep, "Skipping task");
                reports.push(TaskReport {
                    id: task.id.clone(),
                    state: TaskState::Skipped {
                        blocked_by: dep.clone(),
                    },
                    attempts: 0,
                    duration: Duration::ZERO,
                });
                continue;
            }

            reports.push(self.run_task(task, ctx).await);
        }

        let status = if reports.iter().all(|r| r.state == TaskState::Success) {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
        info!(?status, "Run finished");

        RunResult {
            run_id: ctx.run_id.clone(),
            scheduled_date: ctx.scheduled_date,
            status,
            tasks: reports,
        }
    }

    async fn run_task(&self, task: &Task, ctx: &RunContext) -> TaskReport {
        let started = Instant::now();
        let (result, attempts) = with_retry(
            move |attempt| {
                debug!(task = %task.id, attempt, "Executing task");
                task.action().execute(ctx)
            },
            &task.retry,
        )
        .await;

        let state = match result {
            Ok(()) => {
                info!(task = %task.id, attempts, "Task succeeded");
                TaskState::Success
            }
            Err(e) => {
                error!(task = %task.id, owner = %task.owner, attempts, error = %e, "Task failed");
                TaskState::Failed {
                    error: e.to_string(),
                }
            }
        };

        TaskReport {
            id: task.id.clone(),
            state,
            attempts,
            duration: started.elapsed(),
        }
    }
}
