//! Keeps a line source attached to the reconciler.
//!
//! A TCP link to the field controller is re-dialed after every drop until
//! a stop is requested. The store is never reset between connections:
//! the controller re-reports state on its own schedule and the model stays
//! valid meanwhile. Standard input is read once to end of stream.

use std::time::Duration;

use blockwatch_core::config::{TransportConfig, TransportKind};
use blockwatch_core::transport;
use blockwatch_core::{run_ingest, IngestControl, IngestEndReason, IngestError, Reconciler};
use tracing::{info, warn};

use crate::error::BridgeError;

/// Feed lines from the configured transport until stopped or exhausted.
///
/// Returns the total number of lines processed across all connections.
///
/// # Errors
///
/// Returns [`BridgeError::Ingest`] if standard input fails. TCP failures
/// are logged and retried.
pub async fn supervise(
    config: &TransportConfig,
    reconciler: &Reconciler,
    control: &IngestControl,
) -> Result<u64, BridgeError> {
    match config.kind {
        TransportKind::Tcp => Ok(supervise_tcp(config, reconciler, control).await),
        TransportKind::Stdin => {
            info!("reading status lines from standard input");
            let mut source = transport::stdin();
            let summary = run_ingest(&mut source, reconciler, control).await?;
            Ok(summary.lines_processed)
        }
    }
}

async fn supervise_tcp(
    config: &TransportConfig,
    reconciler: &Reconciler,
    control: &IngestControl,
) -> u64 {
    let address = config.address.as_str();
    let mut total: u64 = 0;
    let mut attempt: u64 = 0;

    while !control.is_stop_requested() {
        attempt = attempt.saturating_add(1);

        let connected = tokio::select! {
            biased;
            () = control.stopped() => break,
            connected = transport::connect_tcp(address) => connected,
        };

        match connected {
            Ok(mut source) => {
                info!(address, attempt, "connected to field controller");
                attempt = 0;
                match run_ingest(&mut source, reconciler, control).await {
                    Ok(summary) => {
                        total = total.saturating_add(summary.lines_processed);
                        if summary.end_reason == IngestEndReason::StopRequested {
                            break;
                        }
                        warn!(address, "field controller closed the connection");
                    }
                    Err(IngestError::Transport {
                        lines_processed,
                        source,
                    }) => {
                        total = total.saturating_add(lines_processed);
                        warn!(address, error = %source, "field controller link lost");
                    }
                }
            }
            Err(error) => {
                warn!(address, attempt, error = %error, "could not reach field controller");
            }
        }

        if !pause(config.reconnect_delay(), control).await {
            break;
        }
        info!(address, "reconnecting");
    }

    total
}

/// Sleep for `delay`, returning `false` if a stop arrives first.
async fn pause(delay: Duration, control: &IngestControl) -> bool {
    tokio::select! {
        biased;
        () = control.stopped() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use blockwatch_core::config::PublisherConfig;
    use blockwatch_core::{ChangePublisher, Diagnostics, LogSink, ParseMode, StateStore};
    use blockwatch_types::{BlockId, OccupancyState};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::*;

    fn reconciler() -> Reconciler {
        let diagnostics = Arc::new(Diagnostics::new());
        let publisher = ChangePublisher::spawn(
            LogSink,
            &PublisherConfig::default(),
            Arc::clone(&diagnostics),
        );
        Reconciler::new(
            ParseMode::Strict,
            Arc::new(StateStore::default()),
            publisher,
            diagnostics,
        )
    }

    fn tcp_config(address: String, reconnect_delay_ms: u64) -> TransportConfig {
        TransportConfig {
            kind: TransportKind::Tcp,
            address,
            reconnect_delay_ms,
        }
    }

    #[tokio::test]
    async fn reconnects_and_keeps_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut first, _) = listener.accept().await.unwrap();
            first.write_all(b"BLOCK 1 STANDING x\n").await.unwrap();
            drop(first);

            let (mut second, _) = listener.accept().await.unwrap();
            second.write_all(b"BLOCK 2 RUNNING x\r\n").await.unwrap();
            // Hold the link open until the test is done with it.
            std::future::pending::<()>().await;
        });

        let reconciler = reconciler();
        let control = IngestControl::new();
        let config = tcp_config(address, 10);

        let run = supervise(&config, &reconciler, &control);
        let watch = async {
            while reconciler.store().known_block(BlockId::new(2)).is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            control.request_stop();
        };

        let (total, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(run, watch)
        })
        .await
        .unwrap();

        assert_eq!(total.unwrap(), 2);
        assert_eq!(
            reconciler.store().block_state(BlockId::new(1)),
            OccupancyState::Standing
        );
        assert_eq!(
            reconciler.store().block_state(BlockId::new(2)),
            OccupancyState::Running
        );
        server.abort();
        reconciler.finish().await.unwrap();
    }

    #[tokio::test]
    async fn stop_interrupts_reconnect_wait() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let reconciler = reconciler();
        let control = IngestControl::new();
        let config = tcp_config(address, 60_000);

        let run = supervise(&config, &reconciler, &control);
        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            control.request_stop();
        };

        let (total, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(run, stop)
        })
        .await
        .unwrap();

        assert_eq!(total.unwrap(), 0);
        reconciler.finish().await.unwrap();
    }

    #[tokio::test]
    async fn stop_before_start_never_dials() {
        let reconciler = reconciler();
        let control = IngestControl::new();
        control.request_stop();

        let config = tcp_config(String::from("127.0.0.1:9"), 10);
        let total = supervise(&config, &reconciler, &control).await.unwrap();
        assert_eq!(total, 0);
        reconciler.finish().await.unwrap();
    }
}
