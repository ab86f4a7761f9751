pub mod keep_alive;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;
use uuid::Uuid;

pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Wrapper around tokio-cron-scheduler for background tasks
#[derive(Clone)]
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    /// Create a new scheduler
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Add a job that runs every `interval` until removed.
    /// The task receives its own job id and a handle to this scheduler.
    pub async fn add_repeated_job<F>(&self, interval: Duration, name: &str, task: F) -> Result<Uuid>
    where
        F: Fn(Uuid, Scheduler) -> JobFuture + Send + Sync + 'static,
    {
        let job_name = name.to_string();
        let job = Job::new_repeated_async(interval, move |uuid, lock| {
            let name = job_name.clone();
            let fut = task(uuid, Scheduler { inner: lock });
            Box::pin(async move {
                info!("Running scheduled task: {}", name);
                fut.await;
            })
        })
        .with_context(|| format!("Failed to create repeated job: {}", name))?;

        let id = self
            .inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Scheduled task '{}' every {:?}", name, interval);
        Ok(id)
    }

    pub async fn remove_job(&self, id: &Uuid) -> Result<()> {
        self.inner
            .remove(id)
            .await
            .with_context(|| format!("Failed to remove job: {}", id))
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.clone();
        inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}
