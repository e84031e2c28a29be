//! FireWatch dashboard binary.
//!
//! Wires the live sync engine to its collaborators and runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `firewatch-config.yaml` (or `FIREWATCH_CONFIG`)
//! 3. Build the HTTP hazard feed
//! 4. Create the render store seeded with the home viewport
//! 5. Create the sync scheduler and attach the logging adapter
//! 6. Start polling if `sync.autostart` is set
//! 7. Start the Observer API server
//! 8. Wait for Ctrl-C, then stop polling and drain the observer

mod error;
mod log_adapter;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use firewatch_observer::{AppState, ServerConfig};
use firewatch_sync::{DashboardConfig, HttpHazardFeed, RenderStore, SyncControl, SyncScheduler};
use firewatch_types::RenderModel;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DashboardError;
use crate::log_adapter::LogAdapter;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "firewatch-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the observer server, or signal
/// handling fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("firewatch-dashboard starting");

    run().await.context("firewatch-dashboard failed")?;

    info!("firewatch-dashboard shutdown complete");
    Ok(())
}

async fn run() -> Result<(), DashboardError> {
    // 2. Load configuration.
    let config_path = std::env::var_os("FIREWATCH_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = DashboardConfig::load(&config_path)?;
    info!(
        path = %config_path.display(),
        base_url = config.sources.base_url,
        interval_ms = config.sync.interval_ms,
        staleness_multiplier = config.sync.staleness_multiplier,
        observer_port = config.observer.port,
        "Configuration loaded"
    );

    // 3. Build the hazard feed.
    let feed = HttpHazardFeed::new(&config.sources)?;

    // 4. Create the render store.
    let store = Arc::new(RenderStore::new(RenderModel::initial(
        config.viewport.initial_viewport(),
    )));

    // 5. Create the scheduler and attach the logging adapter.
    let scheduler = Arc::new(SyncScheduler::new(
        feed,
        Arc::clone(&store),
        &config.sync,
    ));
    store.subscribe(LogAdapter::new());

    // 6. Start polling.
    if config.sync.autostart {
        scheduler.start(config.sync.interval());
    } else {
        info!("Autostart disabled, waiting for POST /api/sync/start");
    }

    // 7. Start the Observer API server.
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut observer = if config.observer.enabled {
        let control: Arc<dyn SyncControl> = scheduler.clone();
        let state = Arc::new(AppState::with_sync(Arc::clone(&store), control));
        let server_config = ServerConfig {
            host: config.observer.host.clone(),
            port: config.observer.port,
        };
        Some(tokio::spawn(async move {
            firewatch_observer::start_server(&server_config, state, async {
                let _ = shutdown_rx.await;
            })
            .await
        }))
    } else {
        info!("Observer disabled");
        None
    };

    // 8. Wait for Ctrl-C, or for the observer to die on its own.
    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| DashboardError::Signal {
                message: e.to_string(),
            })?;
            info!("Shutdown signal received");
            None
        }
        Some(joined) = async {
            match observer.as_mut() {
                Some(handle) => Some(handle.await),
                None => None,
            }
        } => {
            warn!("Observer server exited unexpectedly");
            Some(joined)
        }
    };

    scheduler.stop();
    let _ = shutdown_tx.send(());

    let joined = match (early_exit, observer) {
        (Some(joined), _) => Some(joined),
        (None, Some(handle)) => Some(handle.await),
        (None, None) => None,
    };
    if let Some(joined) = joined {
        joined.map_err(|e| DashboardError::ObserverTask {
            message: e.to_string(),
        })??;
    }

    let stats = scheduler.stats();
    info!(
        cycles_applied = stats.cycles_applied,
        ticks_skipped = stats.ticks_skipped,
        results_discarded = stats.results_discarded,
        "Sync engine stopped"
    );
    Ok(())
}
