//! walkschedd - The walk scheduling service
//!
//! This is the main entry point for the walkschedd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Push transport
//! - Scheduler
//! - HTTP server

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walksched_config::{PushConfig, ServiceConfig, load_config};
use walksched_core::Scheduler;
use walksched_http::HttpServer;
use walksched_notify::{HttpPushTransport, LogOnlyTransport, PushTransport};
use walksched_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use walksched_util::{
    WALKSCHED_CONFIG_ENV, WALKSCHED_DATA_DIR_ENV, default_config_path, is_mock_time_active,
};

/// walkschedd - Activation and expiry scheduling for walks
#[derive(Parser, Debug)]
#[command(name = "walkschedd")]
#[command(about = "Activation and expiry scheduling for walks", long_about = None)]
struct Args {
    /// Configuration file path (or set WALKSCHED_CONFIG env var)
    #[arg(short, long, env = WALKSCHED_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Listen address override
    #[arg(long, env = "WALKSCHED_LISTEN")]
    listen: Option<SocketAddr>,

    /// Data directory override (or set WALKSCHED_DATA_DIR env var)
    #[arg(short, long, env = WALKSCHED_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    scheduler: Arc<Scheduler>,
    server: HttpServer,
    store: Arc<dyn Store>,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let config = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            grace_period_secs = config.schedule.grace_period.as_secs(),
            push = config.push.is_some(),
            "Configuration loaded"
        );

        let config = apply_overrides(config, args);

        // Create data directory
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

        // Initialize store
        let db_path = config.data_dir.join("walksched.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Log service start
        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .await?;

        let transport = build_transport(config.push.as_ref())?;
        info!(transport = transport.name(), "Push transport initialized");

        let scheduler = Arc::new(Scheduler::new(store.clone(), transport, config.schedule));

        let server = HttpServer::bind(config.listen_addr, scheduler.clone())
            .await
            .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

        Ok(Self {
            scheduler,
            server,
            store,
        })
    }

    async fn run(self) -> Result<()> {
        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(self.server.run(async move {
            let _ = stop_rx.await;
        }));

        info!("Service running");

        let mut server_done = false;
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
            result = &mut server => {
                server_done = true;
                match result {
                    Ok(Ok(())) => warn!("HTTP server exited unexpectedly"),
                    Ok(Err(e)) => error!(error = %e, "HTTP server error"),
                    Err(e) => error!(error = %e, "HTTP server task failed"),
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down walkschedd");

        // Stop accepting requests before dropping the pending jobs
        let _ = stop_tx.send(());
        if !server_done && let Err(e) = server.await {
            warn!(error = %e, "HTTP server task failed during shutdown");
        }

        let pending = self.scheduler.shutdown().await;
        if pending > 0 {
            warn!(pending_walks = pending, "Pending walk jobs dropped at shutdown");
        }

        if !self.store.is_healthy() {
            warn!("Store unhealthy at shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// CLI and environment overrides take precedence over the config file
fn apply_overrides(mut config: ServiceConfig, args: &Args) -> ServiceConfig {
    if let Some(addr) = args.listen {
        config.listen_addr = addr;
    }
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    config
}

fn build_transport(push: Option<&PushConfig>) -> Result<Arc<dyn PushTransport>> {
    match push {
        Some(push) => {
            let transport = HttpPushTransport::new(push.endpoint.clone(), push.api_key(), push.timeout)
                .context("Failed to create push transport")?;
            info!(endpoint = %transport.endpoint(), "Push delivery enabled");
            Ok(Arc::new(transport))
        }
        None => {
            warn!("No [push] section configured, notifications will only be logged");
            Ok(Arc::new(LogOnlyTransport))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "walkschedd starting");

    if is_mock_time_active() {
        warn!("Mock time is active, scheduling uses a shifted clock");
    }

    // Create and run the service
    let service = Service::new(&args).await?;
    service.run().await
}
