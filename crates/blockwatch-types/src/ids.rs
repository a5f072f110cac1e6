//! Type-safe integer identifier wrappers.
//!
//! Blocks and tracks are both numbered by the field controller with plain
//! non-negative integers. Wrapping them keeps a block number from being
//! handed to a track lookup by accident. Both serialize as bare numbers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`u32`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from its wire number.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the inner number.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Number of an occupancy-detection block (one current sensor zone).
    BlockId
}

define_id! {
    /// Number of a track whose train direction is reported.
    TrackId
}
