mod config;
mod platform;
mod router;
mod scheduler;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::KeepAliveTrigger;
use crate::scheduler::keep_alive::KeepAlive;
use crate::scheduler::Scheduler;
use crate::server::LivenessState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,findid_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Failed to read .env file: {}", e);
        }
    }

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let shown_path = config_path
        .as_deref()
        .unwrap_or_else(|| Path::new(config::DEFAULT_CONFIG_PATH))
        .display()
        .to_string();

    info!("Loading configuration from: {}", shown_path);
    let config = Config::load(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {}", shown_path))?;

    info!("Configuration loaded successfully");
    info!("  Port: {}", config.server.port);
    info!(
        "  Keep-alive URL: {}",
        config.keep_alive.url.as_deref().unwrap_or("(disabled)")
    );

    let scheduler = Scheduler::new().await?;
    scheduler.start().await?;
    let keep_alive = KeepAlive::new(scheduler, config.keep_alive.clone())?;

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    let (server_tx, server_rx) = oneshot::channel::<()>();
    let (bot_tx, bot_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(server::serve(listener, LivenessState::new(), async move {
        let _ = server_rx.await;
    }));

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = bot_tx.send(());
        let _ = server_tx.send(());
    });

    let bot = Bot::new(&config.telegram.bot_token);
    let trigger: Arc<dyn KeepAliveTrigger> = Arc::new(keep_alive.clone());

    info!("Telegram FindID Bot started");
    platform::telegram::run(bot, trigger, async move {
        let _ = bot_rx.await;
    })
    .await?;

    keep_alive.shutdown().await?;
    server.await.context("Liveness server task panicked")??;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
