//! Error types for the bridge binary.
//!
//! [`BridgeError`] is the top-level error type that wraps all possible
//! failure modes during startup and ingestion.

/// Top-level error for the bridge binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: blockwatch_core::config::ConfigError,
    },

    /// The log subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: blockwatch_observer::ServerError,
    },

    /// The line source failed in a way that cannot be retried.
    #[error("ingest error: {source}")]
    Ingest {
        /// The underlying ingestion error.
        #[from]
        source: blockwatch_core::IngestError,
    },

    /// The change publisher did not shut down cleanly.
    #[error("publish error: {source}")]
    Publish {
        /// The underlying publisher error.
        #[from]
        source: blockwatch_core::PublishError,
    },
}
