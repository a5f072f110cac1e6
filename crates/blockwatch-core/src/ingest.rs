//! The sequential ingestion loop.
//!
//! [`run_ingest`] pulls lines from a [`LineSource`] in arrival order and
//! feeds each through the [`Reconciler`] until the stream ends, the
//! transport fails, or a stop is requested through [`IngestControl`].
//!
//! A transport failure ends the loop but leaves the store as it was, so
//! the caller can reconnect and resume with the same reconciler.

use tracing::{info, trace, warn};

use crate::control::IngestControl;
use crate::error::IngestError;
use crate::reconcile::Reconciler;
use crate::transport::LineSource;

/// Why an ingestion loop returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestEndReason {
    /// [`IngestControl::request_stop`] was called.
    StopRequested,
    /// The transport reached a clean end of stream.
    EndOfStream,
}

/// Result of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Why the loop ended.
    pub end_reason: IngestEndReason,
    /// Lines fully processed during this run.
    pub lines_processed: u64,
}

/// Consume lines until the stream ends or a stop is requested.
///
/// A line already being processed when the stop arrives is finished
/// first; a line still being read is left unread.
///
/// # Errors
///
/// Returns [`IngestError::Transport`] if the source fails.
pub async fn run_ingest<S: LineSource>(
    source: &mut S,
    reconciler: &Reconciler,
    control: &IngestControl,
) -> Result<IngestSummary, IngestError> {
    let mut lines_processed: u64 = 0;
    info!("ingestion started");

    loop {
        if control.is_stop_requested() {
            info!(lines_processed, "ingestion stopped on request");
            return Ok(IngestSummary {
                end_reason: IngestEndReason::StopRequested,
                lines_processed,
            });
        }

        let next = tokio::select! {
            biased;
            () = control.stopped() => continue,
            next = source.next_line() => next,
        };

        match next {
            Ok(Some(line)) => {
                let outcome = reconciler.process_line(&line).await;
                trace!(?outcome, "line processed");
                lines_processed = lines_processed.saturating_add(1);
            }
            Ok(None) => {
                info!(lines_processed, "transport reached end of stream");
                return Ok(IngestSummary {
                    end_reason: IngestEndReason::EndOfStream,
                    lines_processed,
                });
            }
            Err(error) => {
                warn!(lines_processed, error = %error, "transport failed");
                return Err(IngestError::Transport {
                    lines_processed,
                    source: error,
                });
            }
        }
    }
}
