//! Task trait and executor for scheduled work.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use medshare_core::error::AppError;

/// A unit of periodic work.
#[async_trait]
pub trait ScheduledTask: Send + Sync + std::fmt::Debug {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Run the task once and return a summary of what it did.
    async fn run(&self) -> Result<Value, JobExecutionError>;
}

/// Error from a task run
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; the next tick will fail the same way
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the next tick may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Classify an application error by whether retrying can help.
    pub fn from_app_error(err: AppError) -> Self {
        if err.kind.is_fatal() {
            Self::Internal(err)
        } else {
            Self::Transient(err.to_string())
        }
    }
}

/// Run `task` once, logging duration and outcome. Errors are logged, not
/// returned, so a failing tick never stops the scheduler.
pub async fn execute(task: Arc<dyn ScheduledTask>) -> Option<Value> {
    let started = Instant::now();
    tracing::debug!(task = task.name(), "Running scheduled task");

    match task.run().await {
        Ok(summary) => {
            tracing::info!(
                task = task.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                summary = %summary,
                "Scheduled task finished"
            );
            Some(summary)
        }
        Err(e) => {
            tracing::error!(
                task = task.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Scheduled task failed"
            );
            None
        }
    }
}
