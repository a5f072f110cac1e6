//! Sources of raw status lines.
//!
//! The core only needs an ordered, possibly endless sequence of text lines.
//! [`ReaderLineSource`] adapts any tokio [`AsyncBufRead`], which covers TCP
//! connections, standard input, and in-memory buffers in tests. Newline
//! framing is assumed; a `\r\n` terminator is stripped as well.
//!
//! Line noise is a line problem, not a link problem: bytes that are not
//! UTF-8 are replaced with `U+FFFD` and the line is handed on for the
//! decoder to reject. A line longer than
//! [`MAX_LINE_BYTES`](crate::decode::MAX_LINE_BYTES) keeps only one byte
//! past the limit, so the decoder sees it as oversized while the buffer
//! stays bounded.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::{info, trace};

use crate::decode::MAX_LINE_BYTES;
use crate::error::TransportError;

/// Bytes of one line kept in memory. Anything beyond is discarded.
const RETAINED_BYTES: usize = MAX_LINE_BYTES + 1;

/// An ordered sequence of status lines.
pub trait LineSource {
    /// Next line without its terminator, or `None` at a clean end of stream.
    ///
    /// Implementations must be cancel-safe: dropping the returned future
    /// before it completes must not lose a line.
    fn next_line(
        &mut self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// Line source over any buffered tokio reader.
#[derive(Debug)]
pub struct ReaderLineSource<R> {
    reader: R,
    /// Bytes of the line in progress. Survives a cancelled read.
    pending: Vec<u8>,
    /// Bytes of the line in progress that were dropped past the limit.
    discarded: usize,
}

impl<R: AsyncBufRead + Unpin + Send> ReaderLineSource<R> {
    /// Wrap a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            discarded: 0,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineSource for ReaderLineSource<R> {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        let Self {
            reader,
            pending,
            discarded,
        } = self;

        loop {
            // Bytes only leave the reader through `consume` below, after
            // they are in `pending`, so cancelling at this await loses nothing.
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                if pending.is_empty() && *discarded == 0 {
                    return Ok(None);
                }
                return Ok(Some(finish_line(pending, discarded)));
            }

            let newline = available.iter().position(|&byte| byte == b'\n');
            let (chunk, consumed) = match newline {
                Some(at) => (available.split_at(at).0, at.saturating_add(1)),
                None => (available, available.len()),
            };
            retain(pending, discarded, chunk);
            reader.consume(consumed);

            if newline.is_some() {
                return Ok(Some(finish_line(pending, discarded)));
            }
        }
    }
}

/// Append `chunk` to the line in progress, up to [`RETAINED_BYTES`].
fn retain(pending: &mut Vec<u8>, discarded: &mut usize, chunk: &[u8]) {
    let room = RETAINED_BYTES.saturating_sub(pending.len());
    let (kept, dropped) = chunk.split_at(chunk.len().min(room));
    pending.extend_from_slice(kept);
    *discarded = discarded.saturating_add(dropped.len());
}

/// Take the line in progress, leaving the buffer empty for the next one.
fn finish_line(pending: &mut Vec<u8>, discarded: &mut usize) -> String {
    if pending.last() == Some(&b'\r') {
        pending.pop();
    }
    if *discarded > 0 {
        trace!(discarded = *discarded, "oversized line truncated");
    }
    let line = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    *discarded = 0;
    line
}

/// Connect to a controller (or serial-to-network bridge) over TCP.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] if the connection fails.
pub async fn connect_tcp(
    address: &str,
) -> Result<ReaderLineSource<BufReader<TcpStream>>, TransportError> {
    info!(address, "connecting to field controller");
    let stream = TcpStream::connect(address)
        .await
        .map_err(|source| TransportError::Connect {
            address: address.to_owned(),
            source,
        })?;
    info!(address, "field controller connected");
    Ok(ReaderLineSource::new(BufReader::new(stream)))
}

/// Read status lines from standard input.
pub fn stdin() -> ReaderLineSource<BufReader<tokio::io::Stdin>> {
    ReaderLineSource::new(BufReader::new(tokio::io::stdin()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_lf_and_crlf_lines_then_ends() {
        let mut source = ReaderLineSource::new(&b"BLOCK 1 OFF x\r\nTRAIN 1 STATUS N\n\nlast"[..]);
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("BLOCK 1 OFF x"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("TRAIN 1 STATUS N"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_fatal() {
        let mut source = ReaderLineSource::new(&b"BLOCK \xff x\nBLOCK 2 OFF x\n"[..]);
        assert_eq!(
            source.next_line().await.unwrap().as_deref(),
            Some("BLOCK \u{fffd} x")
        );
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("BLOCK 2 OFF x"));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_line_is_bounded_and_framing_recovers() {
        let mut input = b"BLOCK 1 RUNNING ".to_vec();
        input.extend(std::iter::repeat_n(b'A', 4096));
        input.extend_from_slice(b"\nBLOCK 2 OFF x\n");
        let mut source = ReaderLineSource::new(input.as_slice());

        let long = source.next_line().await.unwrap().unwrap();
        assert_eq!(long.len(), RETAINED_BYTES);
        assert!(long.starts_with("BLOCK 1 RUNNING AAA"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("BLOCK 2 OFF x"));
    }

    #[tokio::test]
    async fn cancelled_read_keeps_partial_line() {
        use tokio::io::AsyncWriteExt;

        let (mut tx, rx) = tokio::io::duplex(64);
        let mut source = ReaderLineSource::new(BufReader::new(rx));

        tx.write_all(b"BLOCK 3 ").await.unwrap();
        let early = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            source.next_line(),
        )
        .await;
        assert!(early.is_err());

        tx.write_all(b"STANDING x\n").await.unwrap();
        assert_eq!(
            source.next_line().await.unwrap().as_deref(),
            Some("BLOCK 3 STANDING x")
        );
    }

    #[tokio::test]
    async fn tcp_source_reads_from_listener() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"BLOCK 2 RUNNING 1.2A\n").await.unwrap();
        });

        let mut source = connect_tcp(&address).await.unwrap();
        assert_eq!(
            source.next_line().await.unwrap().as_deref(),
            Some("BLOCK 2 RUNNING 1.2A")
        );
        server.await.unwrap();
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(matches!(
            connect_tcp(&address).await,
            Err(TransportError::Connect { .. })
        ));
    }
}
