//! Shared type definitions for the Blockwatch layout state bridge.
//!
//! This crate is the vocabulary shared between the reconciliation core and
//! whatever display layer renders the layout. Types defined here flow
//! downstream to `TypeScript` via `ts-rs` so a web panel can consume the
//! observer API without hand-written mirrors.
//!
//! # Modules
//!
//! - [`ids`] -- Integer identifier wrappers for blocks and tracks
//! - [`enums`] -- Occupancy states and entity kinds
//! - [`structs`] -- State changes, layout snapshots, stream frames, diagnostics reports

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EntityKind, OccupancyState};
pub use ids::{BlockId, TrackId};
pub use structs::{ChangeValue, DiagnosticsReport, LayoutSnapshot, StateChange, StreamFrame};
