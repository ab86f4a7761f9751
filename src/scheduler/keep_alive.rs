use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::KeepAliveConfig;
use crate::platform::KeepAliveTrigger;
use crate::scheduler::Scheduler;

/// Pings the service's own public URL in short bursts so the hosting
/// platform does not idle it. A burst is `pings` requests spaced by
/// `interval_secs`; at most one burst runs at a time.
#[derive(Clone)]
pub struct KeepAlive {
    scheduler: Scheduler,
    client: reqwest::Client,
    config: KeepAliveConfig,
    running: Arc<AtomicBool>,
    job: Arc<Mutex<Option<Uuid>>>,
}

impl KeepAlive {
    pub fn new(scheduler: Scheduler, config: KeepAliveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build keep-alive HTTP client")?;

        Ok(Self {
            scheduler,
            client,
            config,
            running: Arc::new(AtomicBool::new(false)),
            job: Arc::new(Mutex::new(None)),
        })
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start_burst(&self, url: String) -> Result<()> {
        let client = self.client.clone();
        let running = self.running.clone();
        let job = self.job.clone();
        let pings = self.config.pings;
        let count = Arc::new(AtomicU32::new(0));

        let id = self
            .scheduler
            .add_repeated_job(
                Duration::from_secs(self.config.interval_secs),
                "keep-alive",
                move |id, scheduler| {
                    let client = client.clone();
                    let url = url.clone();
                    let running = running.clone();
                    let job = job.clone();
                    let count = count.clone();
                    Box::pin(async move {
                        // Late ticks after the burst finished are dropped
                        if count.load(Ordering::SeqCst) >= pings {
                            return;
                        }
                        ping(&client, &url).await;
                        if count.fetch_add(1, Ordering::SeqCst) + 1 >= pings {
                            if let Err(e) = scheduler.remove_job(&id).await {
                                warn!("{:#}", e);
                            }
                            clear_job(&job, &id);
                            running.store(false, Ordering::SeqCst);
                            info!("Service activation complete");
                        }
                    })
                },
            )
            .await?;

        if let Ok(mut current) = self.job.lock() {
            *current = Some(id);
        }
        Ok(())
    }

    /// Stop the running burst, if any
    pub async fn cancel(&self) {
        let id = self.job.lock().ok().and_then(|mut current| current.take());
        if let Some(id) = id {
            if let Err(e) = self.scheduler.remove_job(&id).await {
                warn!("{:#}", e);
            }
            info!("Keep-alive burst cancelled");
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.cancel().await;
        self.scheduler.shutdown().await
    }
}

fn clear_job(job: &Mutex<Option<Uuid>>, id: &Uuid) {
    if let Ok(mut current) = job.lock() {
        if current.as_ref() == Some(id) {
            *current = None;
        }
    }
}

async fn ping(client: &reqwest::Client, url: &str) {
    match client.get(url).send().await {
        Ok(response) => info!("Keep-alive ping: {}", response.status()),
        Err(e) => error!("Keep-alive failed: {}", e),
    }
}

impl KeepAliveTrigger for KeepAlive {
    fn activate(&self) {
        let Some(url) = self.config.url.clone() else {
            debug!("No keep-alive URL configured, skipping activation");
            return;
        };
        if self.config.pings == 0 {
            return;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Keep-alive burst already running");
            return;
        }

        info!("Activating service with keep-alive pings...");
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.start_burst(url).await {
                error!("Failed to start keep-alive burst: {:#}", e);
                this.running.store(false, Ordering::SeqCst);
            }
        });
    }
}
