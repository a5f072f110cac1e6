//! Enumeration types shared by the core and display layers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

/// What a block's current sensor reports about the train on it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum OccupancyState {
    /// Unoccupied, or the sensor is inactive. Blocks start here.
    #[default]
    Off,
    /// Occupied by a stationary train.
    Standing,
    /// Occupied by a moving train.
    Running,
}

impl OccupancyState {
    /// Every state, in keyword priority order.
    ///
    /// When a keyword token could name more than one state, the earliest
    /// entry here wins.
    pub const PRIORITY: [Self; 3] = [Self::Off, Self::Standing, Self::Running];

    /// The literal keyword the field controller sends for this state.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Standing => "STANDING",
            Self::Running => "RUNNING",
        }
    }

    /// Resolve a keyword token that must equal one of the literals exactly.
    pub fn from_keyword(token: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|state| state.keyword() == token)
    }

    /// Resolve a keyword token by containment, first match in
    /// [`PRIORITY`](Self::PRIORITY) order.
    pub fn find_in(token: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|state| token.contains(state.keyword()))
    }

    /// Whether a train is on the block.
    pub const fn is_occupied(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl core::fmt::Display for OccupancyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.keyword())
    }
}

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// Which table a [`StateChange`](crate::StateChange) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// An occupancy-detection block.
    Block,
    /// A track's last reported train direction.
    TrackStatus,
}
