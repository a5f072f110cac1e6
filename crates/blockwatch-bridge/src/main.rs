//! Bridge binary for Blockwatch.
//!
//! This is the main entry point that wires the field controller link to
//! the layout model and the Observer API. It loads configuration,
//! initializes all subsystems, and reconciles status lines until Ctrl-C
//! or the end of the input stream.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `blockwatch.yaml` (or `BLOCKWATCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the state store and diagnostics counters
//! 4. Start the Observer API server (when enabled)
//! 5. Start the change publisher with the matching sink
//! 6. Install the Ctrl-C handler
//! 7. Supervise the transport until stopped
//! 8. Flush pending changes and log the final counters

mod error;
mod logging;
mod supervisor;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use blockwatch_core::config::BridgeConfig;
use blockwatch_core::{ChangePublisher, Diagnostics, IngestControl, LogSink, Reconciler, StateStore};
use blockwatch_observer::{spawn_observer, AppState, ServerConfig};
use tracing::{info, warn};

use crate::error::BridgeError;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "blockwatch.yaml";

/// Application entry point for the bridge.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the observer cannot be
/// set up, or if the line source fails unrecoverably.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, config_path, from_file) =
        load_config().context("failed to load bridge configuration")?;

    // 2. Initialize structured logging.
    logging::init(&config.logging).context("failed to initialize logging")?;

    info!("blockwatch-bridge starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        transport = ?config.transport.kind,
        address = config.transport.address,
        parse_mode = ?config.parsing.mode,
        track_mapping = ?config.parsing.track_mapping,
        queue_capacity = config.publisher.queue_capacity,
        send_timeout_ms = config.publisher.send_timeout_ms,
        "Bridge configuration"
    );

    // 3. Create the model.
    let store = Arc::new(StateStore::new(config.parsing.track_mapping));
    let diagnostics = Arc::new(Diagnostics::new());
    let control = Arc::new(IngestControl::new());

    // 4 + 5. Observer and publisher.
    let (publisher, observer) = if config.observer.enabled {
        let app_state = Arc::new(AppState::new(Arc::clone(&store), Arc::clone(&diagnostics)));
        let observer = spawn_observer(
            &ServerConfig::from(&config.observer),
            Arc::clone(&app_state),
            Arc::clone(&control),
        )
        .await
        .map_err(BridgeError::from)?;
        info!(addr = %observer.local_addr, "Observer API server started");
        let publisher =
            ChangePublisher::spawn(app_state.sink(), &config.publisher, Arc::clone(&diagnostics));
        (publisher, Some(observer))
    } else {
        info!("Observer disabled, changes go to the log");
        let publisher = ChangePublisher::spawn(LogSink, &config.publisher, Arc::clone(&diagnostics));
        (publisher, None)
    };

    let reconciler = Reconciler::new(
        config.parsing.mode,
        Arc::clone(&store),
        publisher,
        Arc::clone(&diagnostics),
    );

    // 6. Ctrl-C requests a cooperative stop.
    let ctrl_c = {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "Ctrl-C handler unavailable"),
            }
        })
    };

    // 7. Supervise the transport.
    let ingest = supervisor::supervise(&config.transport, &reconciler, &control).await;

    // 8. Signal the observer to stop, flush the publisher while its
    //    connections drain, then wait for the observer task to end.
    control.request_stop();
    ctrl_c.abort();
    let delivered = reconciler.finish().await.map_err(BridgeError::from)?;
    if let Some(observer) = observer {
        if let Err(e) = observer.handle.await {
            warn!(error = %e, "Observer task did not shut down cleanly");
        }
    }

    let report = diagnostics.report();
    info!(
        lines_received = report.lines_received,
        events_applied = report.events_applied,
        changes_published = report.changes_published,
        publishes_dropped = report.publishes_dropped,
        malformed_lines = report.malformed_lines,
        unrecognized_keywords = report.unrecognized_keywords,
        unclassified_lines = report.unclassified_lines,
        delivered,
        "blockwatch-bridge stopped"
    );

    let lines = ingest.context("line source failed")?;
    info!(lines, "ingestion complete");
    Ok(())
}

/// Load the bridge configuration.
///
/// Reads the path in `BLOCKWATCH_CONFIG`, or `blockwatch.yaml` in the
/// working directory. A missing file means defaults, still subject to the
/// environment overrides.
fn load_config() -> Result<(BridgeConfig, PathBuf, bool), BridgeError> {
    let config_path = std::env::var_os("BLOCKWATCH_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if config_path.exists() {
        let config = BridgeConfig::from_file(&config_path)?;
        Ok((config, config_path, true))
    } else {
        let mut config = BridgeConfig::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok((config, config_path, false))
    }
}
