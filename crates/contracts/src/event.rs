//! Merged event and position records
//!
//! The payload bytes stay opaque end to end; only the timestamp, source tag
//! and interaction position are interpreted by the pipeline.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::StreamName;

/// Interaction position of one stored event (position-database entry).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One event in a merged dataset.
///
/// The scheduled timestamp is stored split into whole seconds since the Unix
/// epoch plus a nanosecond remainder, matching the resolution the scheduler
/// works at without forcing a date library onto readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedEvent {
    /// Whole seconds of live time since the epoch anchor
    pub utc_secs: i64,

    /// Sub-second remainder in nanoseconds (always < 1_000_000_000)
    pub utc_nanos: u32,

    /// Stream the event was drawn from
    pub source: StreamName,

    /// Opaque simulation record (zero-copy)
    pub payload: Bytes,
}
