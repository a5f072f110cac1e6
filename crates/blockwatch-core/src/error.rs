//! Error types for the reconciliation core.
//!
//! Per-line failures ([`LineError`]) are never fatal: the line is dropped
//! before any state is touched and a diagnostic is recorded. Only
//! [`TransportError`] ends an ingestion loop.

use blockwatch_types::BlockId;

use crate::classify::EventKind;

/// Why a single status line produced no state transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// Wrong token count, or a number where none parses.
    #[error("malformed {kind:?} line: {reason}")]
    MalformedLine {
        /// The kind the line was classified as.
        kind: EventKind,
        /// What was wrong with it.
        reason: String,
    },

    /// A block line whose state token names no known state.
    #[error("block {block_id}: unrecognized state keyword {token:?}")]
    UnrecognizedKeyword {
        /// The block the line referred to.
        block_id: BlockId,
        /// The offending token.
        token: String,
    },

    /// The line matches neither message pattern.
    #[error("line matches no known message pattern")]
    UnclassifiedLine,
}

impl LineError {
    pub(crate) fn malformed(kind: EventKind, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            kind,
            reason: reason.into(),
        }
    }
}

/// Failures of the byte stream that delivers status lines.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The field controller could not be reached.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Address that was dialed.
        address: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading the next line failed at the I/O level.
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// An ingestion loop ended abnormally.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The transport failed. Previously applied state stays valid.
    #[error("transport failed after {lines_processed} lines: {source}")]
    Transport {
        /// Lines fully processed before the failure.
        lines_processed: u64,
        /// The underlying transport error.
        source: TransportError,
    },
}

/// Failures of the change publisher itself.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The drain task panicked or was cancelled.
    #[error("publisher task failed: {0}")]
    Task(String),
}
