//! Status line parsing and layout state reconciliation for Blockwatch.
//!
//! A field controller on the layout reports block occupancy and train
//! direction as whitespace-separated text lines. This crate turns each line
//! into a typed event, applies it to an authoritative in-memory model of the
//! layout, and hands every resulting change to a display.
//!
//! # Pipeline
//!
//! ```text
//! LineSource --> tokenize --> classify --> decode --> StateStore --> ChangePublisher --> ChangeSink
//! ```
//!
//! # Modules
//!
//! - [`tokenize`] -- Whitespace tokenization of a raw line.
//! - [`classify`] -- Event kind selection ([`ParseMode`] aware).
//! - [`decode`] -- Typed [`Event`] records with field validation.
//! - [`store`] -- [`StateStore`]: block and track tables behind their own guards.
//! - [`publish`] -- [`ChangePublisher`]: bounded hand-off to a [`ChangeSink`].
//! - [`diagnostics`] -- Lock-free ingestion counters.
//! - [`reconcile`] -- [`Reconciler`]: the per-line pipeline.
//! - [`transport`] -- [`LineSource`] trait and tokio reader adapters.
//! - [`control`] -- [`IngestControl`]: cooperative stop signal.
//! - [`ingest`] -- [`run_ingest`]: the sequential ingestion loop.
//! - [`config`] -- YAML configuration with typed defaults.
//! - [`error`] -- Error taxonomy.
//!
//! [`ParseMode`]: classify::ParseMode
//! [`Event`]: decode::Event
//! [`StateStore`]: store::StateStore
//! [`ChangePublisher`]: publish::ChangePublisher
//! [`ChangeSink`]: publish::ChangeSink
//! [`Reconciler`]: reconcile::Reconciler
//! [`LineSource`]: transport::LineSource
//! [`IngestControl`]: control::IngestControl
//! [`run_ingest`]: ingest::run_ingest

pub mod classify;
pub mod config;
pub mod control;
pub mod decode;
pub mod diagnostics;
pub mod error;
pub mod ingest;
pub mod publish;
pub mod reconcile;
pub mod store;
pub mod tokenize;
pub mod transport;

pub use classify::{EventKind, ParseMode};
pub use control::IngestControl;
pub use decode::Event;
pub use diagnostics::Diagnostics;
pub use error::{IngestError, LineError, PublishError, TransportError};
pub use ingest::{run_ingest, IngestEndReason, IngestSummary};
pub use publish::{ChangePublisher, ChangeSink, LogSink, PublishOutcome};
pub use reconcile::{LineOutcome, Reconciler};
pub use store::{StateStore, TrackMapping};
pub use transport::{LineSource, ReaderLineSource};
