//! Periodic deletion of old chat messages.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info};

use forum_core::config::RetentionConfig;
use forum_core::error::AppError;
use forum_core::traits::MessagePersister;

/// Deletes messages older than the configured age on a fixed period.
pub struct RetentionSweeper {
    /// Store to sweep.
    persister: Arc<dyn MessagePersister>,
    /// Age after which messages are deleted.
    max_age: Duration,
    /// Sweep period.
    interval: Duration,
    /// Underlying scheduler, set once started.
    scheduler: Option<JobScheduler>,
}

impl std::fmt::Debug for RetentionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionSweeper")
            .field("max_age", &self.max_age)
            .field("interval", &self.interval)
            .finish()
    }
}

impl RetentionSweeper {
    /// Create a sweeper from the retention settings.
    pub fn new(persister: Arc<dyn MessagePersister>, config: &RetentionConfig) -> Self {
        Self {
            persister,
            max_age: config.max_age(),
            interval: config.sweep_interval(),
            scheduler: None,
        }
    }

    /// Run one sweep. Returns how many messages were deleted.
    pub async fn sweep_once(&self) -> Result<u64, AppError> {
        sweep(self.persister.as_ref(), self.max_age).await
    }

    /// Schedule the sweep every interval. The first sweep runs one interval after start.
    pub async fn start(&mut self) -> Result<(), AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        let persister = Arc::clone(&self.persister);
        let max_age = self.max_age;
        let job = CronJob::new_repeated_async(self.interval, move |_uuid, _lock| {
            let persister = Arc::clone(&persister);
            Box::pin(async move {
                // Errors are logged inside; the next period tries again.
                let _ = sweep(persister.as_ref(), max_age).await;
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create retention schedule: {}", e)))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add retention schedule: {}", e)))?;

        scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        info!(
            interval_secs = self.interval.as_secs(),
            max_age_hours = self.max_age.as_secs() / 3600,
            "Retention sweep scheduled"
        );
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Stop the schedule. No-op if it was never started.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;
            info!("Retention sweep stopped");
        }
        Ok(())
    }
}

async fn sweep(persister: &dyn MessagePersister, max_age: Duration) -> Result<u64, AppError> {
    match persister.delete_older_than(max_age).await {
        Ok(deleted) => {
            info!(deleted, "Old chat messages deleted");
            Ok(deleted)
        }
        Err(e) => {
            error!(error = %e, "Retention sweep failed");
            Err(e)
        }
    }
}
