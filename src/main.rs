//! Tiered Cache - demo host
//!
//! Wires a cache context the way an application process would: build it once
//! at startup, run the background sweep and warming, report health, and shut
//! everything down on a signal.

use std::sync::Arc;

use anyhow::Context as _;
use serde_json::json;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::invalidation::TracingRevalidator;
use tiered_cache::warming::{DataSources, MemorySource, PreloadTarget};
use tiered_cache::{CacheContext, Config};

/// Entry point for the demo host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the cache context over in-memory data sources
/// 4. Start the expiry sweep and recurring warming
/// 5. Exercise a preload and an invalidation, then log health
/// 6. Wait for SIGINT/SIGTERM and shut the context down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiered cache demo host");

    let config = Config::from_env();
    info!(
        "Configuration loaded: global={}, user={}, project={}, default_ttl={}s, cleanup_interval={}s",
        config.global_max_entries,
        config.user_max_entries,
        config.project_max_entries,
        config.default_ttl,
        config.cleanup_interval
    );

    let ctx = CacheContext::init(config.clone(), demo_sources(), Arc::new(TracingRevalidator))
        .context("failed to initialize cache context")?;

    ctx.schedule_cleanup(config.cleanup_interval())
        .context("failed to start expiry sweep")?;
    ctx.schedule_recurring_warming(
        vec!["u-1".to_string(), "u-2".to_string()],
        config.warming_interval(),
    )
    .context("failed to start warming")?;

    match ctx
        .preload(&PreloadTarget::Route("/projects/p-1".to_string()), Some("u-1"))
        .await
    {
        Some(_) => info!("Preloaded /projects/p-1"),
        None => warn!("Preload of /projects/p-1 returned nothing"),
    }
    ctx.cascade_invalidation("project", "p-1", Some("u-1"));

    ctx.track_metrics();
    let report = ctx.health_report();
    info!(status = report.status.as_str(), "Initial health report");

    shutdown_signal().await;
    ctx.shutdown();

    info!("Shutdown complete");
    Ok(())
}

fn demo_sources() -> DataSources {
    DataSources {
        users: Arc::new(
            MemorySource::new("users")
                .with("u-1", json!({"id": "u-1", "name": "Ada"}))
                .with("u-2", json!({"id": "u-2", "name": "Grace"})),
        ),
        user_projects: Arc::new(
            MemorySource::new("user_projects")
                .with("u-1", json!([{"id": "p-1", "name": "Compiler"}]))
                .with("u-2", json!([])),
        ),
        user_stats: Arc::new(MemorySource::new("user_stats")),
        projects: Arc::new(
            MemorySource::new("projects")
                .with("p-1", json!({"id": "p-1", "name": "Compiler", "progress": 40})),
        ),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
