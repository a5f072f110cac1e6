//! Records exchanged between the reconciliation core and display layers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EntityKind, OccupancyState};
use crate::ids::{BlockId, TrackId};

// ---------------------------------------------------------------------------
// State changes
// ---------------------------------------------------------------------------

/// The new value carried by a [`StateChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ChangeValue {
    /// A block's new occupancy.
    Occupancy(OccupancyState),
    /// A track's new direction token.
    Direction(String),
}

/// One entity's value changed.
///
/// This is an inert description. How a display maps it onto an image layer
/// or a text field is up to the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateChange {
    /// Which table the entity lives in.
    pub entity_kind: EntityKind,
    /// The entity's number within its table.
    pub entity_id: u32,
    /// The value the entity now holds.
    pub new_value: ChangeValue,
}

impl StateChange {
    /// A block moved to `state`.
    pub const fn block(id: BlockId, state: OccupancyState) -> Self {
        Self {
            entity_kind: EntityKind::Block,
            entity_id: id.into_inner(),
            new_value: ChangeValue::Occupancy(state),
        }
    }

    /// A track now reports `direction`.
    pub fn track(id: TrackId, direction: String) -> Self {
        Self {
            entity_kind: EntityKind::TrackStatus,
            entity_id: id.into_inner(),
            new_value: ChangeValue::Direction(direction),
        }
    }

    /// The occupancy carried by a block change, if this is one.
    pub const fn occupancy(&self) -> Option<OccupancyState> {
        match self.new_value {
            ChangeValue::Occupancy(state) => Some(state),
            ChangeValue::Direction(_) => None,
        }
    }

    /// The direction carried by a track change, if this is one.
    pub fn direction(&self) -> Option<&str> {
        match &self.new_value {
            ChangeValue::Direction(direction) => Some(direction),
            ChangeValue::Occupancy(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Copy of both state tables at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LayoutSnapshot {
    /// Every block reported so far and its occupancy.
    pub blocks: BTreeMap<BlockId, OccupancyState>,
    /// Every track reported so far and its direction.
    pub tracks: BTreeMap<TrackId, String>,
}

// ---------------------------------------------------------------------------
// Change stream
// ---------------------------------------------------------------------------

/// One message on the live change stream.
///
/// A client gets a [`Snapshot`](Self::Snapshot) first, then
/// [`Change`](Self::Change)s. Another snapshot replaces everything the
/// client holds; it is sent whenever the client may have missed changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StreamFrame {
    /// The whole layout.
    Snapshot(LayoutSnapshot),
    /// One entity moved.
    Change(StateChange),
}

/// Ingestion counters for the observability surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DiagnosticsReport {
    /// Lines taken from the transport.
    pub lines_received: u64,
    /// Decoded events applied to the store (changed or not).
    pub events_applied: u64,
    /// Changes handed to the display.
    pub changes_published: u64,
    /// Changes dropped because the display queue was full or closed.
    pub publishes_dropped: u64,
    /// Lines with a wrong token count or a bad number.
    pub malformed_lines: u64,
    /// Block lines whose state keyword matched nothing.
    pub unrecognized_keywords: u64,
    /// Lines that matched neither message pattern.
    pub unclassified_lines: u64,
    /// When ingestion started.
    pub started_at: DateTime<Utc>,
    /// When the most recent line arrived.
    pub last_line_at: Option<DateTime<Utc>>,
}
