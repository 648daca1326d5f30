//! Cron scheduler for periodic tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use medshare_core::config::WorkerConfig;
use medshare_core::error::AppError;

use crate::executor::{ScheduledTask, execute};
use crate::jobs::ExpirySweepTask;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Register the built-in tasks using the configured schedules
    pub async fn register_default_tasks(
        &self,
        config: &WorkerConfig,
        expiry: ExpirySweepTask,
    ) -> Result<(), AppError> {
        self.register(&config.expiry_sweep_cron, Arc::new(expiry))
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `task` on the given six-field cron schedule
    pub async fn register(
        &self,
        schedule: &str,
        task: Arc<dyn ScheduledTask>,
    ) -> Result<(), AppError> {
        let name = task.name().to_string();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let task = Arc::clone(&task);
            Box::pin(async move {
                execute(task).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{schedule}' for {name}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {name} schedule: {e}")))?;

        tracing::info!(task = %name, schedule = %schedule, "Registered scheduled task");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
