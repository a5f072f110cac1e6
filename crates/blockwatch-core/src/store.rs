//! The authoritative in-memory model of the layout.
//!
//! [`StateStore`] owns two independent tables, blocks and tracks, each
//! behind its own [`RwLock`]. The ingestion path is the single writer;
//! display and query code read concurrently. The tables are never
//! cross-referenced, so no operation holds both guards at once.
//!
//! Every write is a single map insert, so a guard poisoned by a panicking
//! reader still protects a consistent map and is recovered rather than
//! propagated.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use blockwatch_types::{BlockId, LayoutSnapshot, OccupancyState, StateChange, TrackId};
use serde::Deserialize;
use tracing::trace;

use crate::decode::Event;

// ---------------------------------------------------------------------------
// Track mapping
// ---------------------------------------------------------------------------

/// How reported track numbers map onto track status entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackMapping {
    /// Track 1 is itself; every other number lands on track 2.
    ///
    /// Matches displays built with exactly two direction fields.
    #[default]
    TwoTrack,
    /// Every reported track number is its own entity.
    PerTrack,
}

impl TrackMapping {
    /// Track that receives reports for [`TrackMapping::TwoTrack`] numbers
    /// other than 1.
    pub const FALLBACK_TRACK: TrackId = TrackId::new(2);

    /// The entity a reported track number updates.
    pub const fn resolve(self, reported: TrackId) -> TrackId {
        match self {
            Self::TwoTrack => {
                if reported.into_inner() == 1 {
                    reported
                } else {
                    Self::FALLBACK_TRACK
                }
            }
            Self::PerTrack => reported,
        }
    }
}

// ---------------------------------------------------------------------------
// State store
// ---------------------------------------------------------------------------

/// Current occupancy of every block and direction of every track.
#[derive(Debug, Default)]
pub struct StateStore {
    blocks: RwLock<BTreeMap<BlockId, OccupancyState>>,
    tracks: RwLock<BTreeMap<TrackId, String>>,
    track_mapping: TrackMapping,
}

impl StateStore {
    /// Create an empty store.
    pub fn new(track_mapping: TrackMapping) -> Self {
        Self {
            blocks: RwLock::new(BTreeMap::new()),
            tracks: RwLock::new(BTreeMap::new()),
            track_mapping,
        }
    }

    /// The track mapping this store resolves reports with.
    pub const fn track_mapping(&self) -> TrackMapping {
        self.track_mapping
    }

    /// Apply a decoded event.
    ///
    /// Returns the change when the entity's value actually moved. Applying
    /// the same event again is a no-op and returns `None`.
    pub fn apply(&self, event: &Event) -> Option<StateChange> {
        match event {
            Event::BlockState { block_id, state } => self.apply_block(*block_id, *state),
            Event::TrainStatus {
                track_id,
                direction,
            } => self.apply_track(*track_id, direction),
            Event::Unrecognized { .. } => None,
        }
    }

    fn apply_block(&self, id: BlockId, state: OccupancyState) -> Option<StateChange> {
        let mut blocks = write(&self.blocks);
        // Blocks come into existence at the default state, so a first
        // report of that state is not a change.
        let previous = blocks.insert(id, state).unwrap_or_default();
        if previous == state {
            trace!(block = %id, %state, "block unchanged");
            None
        } else {
            Some(StateChange::block(id, state))
        }
    }

    fn apply_track(&self, reported: TrackId, direction: &str) -> Option<StateChange> {
        let id = self.track_mapping.resolve(reported);
        let mut tracks = write(&self.tracks);
        if tracks.get(&id).is_some_and(|current| current == direction) {
            trace!(track = %id, direction, "track unchanged");
            return None;
        }
        tracks.insert(id, direction.to_owned());
        Some(StateChange::track(id, direction.to_owned()))
    }

    /// Occupancy of a block; [`OccupancyState::Off`] until first reported.
    pub fn block_state(&self, id: BlockId) -> OccupancyState {
        self.known_block(id).unwrap_or_default()
    }

    /// Occupancy of a block that has been reported at least once.
    pub fn known_block(&self, id: BlockId) -> Option<OccupancyState> {
        read(&self.blocks).get(&id).copied()
    }

    /// Last reported direction of a track entity.
    pub fn track_direction(&self, id: TrackId) -> Option<String> {
        read(&self.tracks).get(&id).cloned()
    }

    /// Copy of the block table.
    pub fn blocks(&self) -> BTreeMap<BlockId, OccupancyState> {
        read(&self.blocks).clone()
    }

    /// Copy of the track table.
    pub fn tracks(&self) -> BTreeMap<TrackId, String> {
        read(&self.tracks).clone()
    }

    /// Copy of both tables, each taken under its own guard.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            blocks: self.blocks(),
            tracks: self.tracks(),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
