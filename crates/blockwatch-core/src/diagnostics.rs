//! Lock-free ingestion counters.
//!
//! Shared via [`Arc`](std::sync::Arc) between the ingestion path, the
//! publisher task, and the observer API. Counters only ever increase.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use blockwatch_types::DiagnosticsReport;
use chrono::{DateTime, Utc};

use crate::error::LineError;

/// Running totals of what ingestion has seen.
#[derive(Debug)]
pub struct Diagnostics {
    lines_received: AtomicU64,
    events_applied: AtomicU64,
    changes_published: AtomicU64,
    publishes_dropped: AtomicU64,
    malformed_lines: AtomicU64,
    unrecognized_keywords: AtomicU64,
    unclassified_lines: AtomicU64,
    started_at: DateTime<Utc>,
    last_line_at: Mutex<Option<DateTime<Utc>>>,
}

impl Diagnostics {
    /// Start counting from zero.
    pub fn new() -> Self {
        Self {
            lines_received: AtomicU64::new(0),
            events_applied: AtomicU64::new(0),
            changes_published: AtomicU64::new(0),
            publishes_dropped: AtomicU64::new(0),
            malformed_lines: AtomicU64::new(0),
            unrecognized_keywords: AtomicU64::new(0),
            unclassified_lines: AtomicU64::new(0),
            started_at: Utc::now(),
            last_line_at: Mutex::new(None),
        }
    }

    /// A line arrived from the transport.
    pub fn record_line(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_line_at.lock() {
            *last = Some(Utc::now());
        }
    }

    /// A decoded event reached the store.
    pub fn record_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// The display received a change.
    pub fn record_published(&self) {
        self.changes_published.fetch_add(1, Ordering::Relaxed);
    }

    /// A change was dropped on the way to the display.
    pub fn record_publish_dropped(&self) {
        self.publishes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// A line was rejected.
    pub fn record_rejected(&self, error: &LineError) {
        let counter = match error {
            LineError::MalformedLine { .. } => &self.malformed_lines,
            LineError::UnrecognizedKeyword { .. } => &self.unrecognized_keywords,
            LineError::UnclassifiedLine => &self.unclassified_lines,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Lines received so far.
    pub fn lines_received(&self) -> u64 {
        self.lines_received.load(Ordering::Relaxed)
    }

    /// Changes delivered so far.
    pub fn changes_published(&self) -> u64 {
        self.changes_published.load(Ordering::Relaxed)
    }

    /// Changes dropped so far.
    pub fn publishes_dropped(&self) -> u64 {
        self.publishes_dropped.load(Ordering::Relaxed)
    }

    /// Serializable copy of every counter.
    pub fn report(&self) -> DiagnosticsReport {
        DiagnosticsReport {
            lines_received: self.lines_received(),
            events_applied: self.events_applied.load(Ordering::Relaxed),
            changes_published: self.changes_published(),
            publishes_dropped: self.publishes_dropped(),
            malformed_lines: self.malformed_lines.load(Ordering::Relaxed),
            unrecognized_keywords: self.unrecognized_keywords.load(Ordering::Relaxed),
            unclassified_lines: self.unclassified_lines.load(Ordering::Relaxed),
            started_at: self.started_at,
            last_line_at: self.last_line_at.lock().ok().and_then(|last| *last),
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
