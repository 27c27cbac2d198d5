//! Container layout constants and section records
//!
//! A container is a single file:
//!
//! ```text
//! [0..8)    magic  "EVSTORE1"
//! [8..12)   format version, u32 LE
//! [12..20)  TOC offset, u64 LE
//! [20..)    section payloads, back to back
//! [toc..]   TOC: bincode Vec<SectionEntry>
//! ```
//!
//! The events table is one section with its own index so single records can
//! be fetched without loading the rest:
//!
//! ```text
//! [count: u64 LE][count+1 offsets, u64 LE, relative to blob area][blobs]
//! ```

use serde::{Deserialize, Serialize};

use contracts::Position;

/// File magic, first 8 bytes of every container.
pub const STORE_MAGIC: &[u8; 8] = b"EVSTORE1";

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Fixed prefix length: magic + version + TOC offset.
pub const PREFIX_LEN: u64 = 20;

/// Efficiency/livetime header of a source container.
pub const SECTION_HEADER: &str = "header";

/// Position database of a source container.
pub const SECTION_POSDB: &str = "posdb";

/// Opaque run metadata, cloned verbatim into merged outputs.
pub const SECTION_RUN_INFO: &str = "run_info";

/// Livetime header of a merged container.
pub const SECTION_MERGE_INFO: &str = "merge_info";

/// File extension used for both source and merged containers.
pub const CONTAINER_EXTENSION: &str = "evd";

/// One TOC entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub name: String,
    pub offset: u64,
    pub len: u64,
}

/// Header section of a source container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceHeader {
    /// Detection efficiency reported by the upstream simulation, in [0, 1]
    pub efficiency: f64,
}

/// Header section of a merged container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DatasetHeader {
    /// Total elapsed live time covered by the dataset (seconds)
    pub livetime: f64,

    /// Number of events actually written
    pub event_count: u64,
}

/// Parallel x/y/z interaction positions, one triple per stored event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionDb {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl PositionDb {
    pub fn push(&mut self, position: Position) {
        self.x.push(position.x);
        self.y.push(position.y);
        self.z.push(position.z);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Position of event `index`, if the index is in range.
    pub fn get(&self, index: usize) -> Option<Position> {
        Some(Position {
            x: *self.x.get(index)?,
            y: *self.y.get(index)?,
            z: *self.z.get(index)?,
        })
    }

    /// True when the three coordinate arrays agree in length.
    pub fn is_consistent(&self) -> bool {
        self.x.len() == self.y.len() && self.y.len() == self.z.len()
    }
}
