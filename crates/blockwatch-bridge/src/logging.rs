//! Tracing subscriber setup.

use blockwatch_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::error::BridgeError;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `logging.level` from the config
/// file is used as the filter.
pub fn init(config: &LoggingConfig) -> Result<(), BridgeError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| BridgeError::Logging {
            message: format!("invalid log filter {:?}: {e}", config.level),
        })?;

    let installed = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    installed.map_err(|e| BridgeError::Logging {
        message: e.to_string(),
    })
}
