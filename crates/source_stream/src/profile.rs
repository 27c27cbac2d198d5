//! Stream profile: headers and position databases
//!
//! Loaded eagerly at stream construction; the heavy events tables stay on
//! disk until materialization.

use std::path::PathBuf;

use tracing::{debug, warn};

use contracts::{ContractError, Position};
use record_store::{Container, PositionDb, SourceHeader, SECTION_HEADER, SECTION_POSDB};

/// Aggregate efficiency plus per-file position databases.
#[derive(Debug)]
pub struct StreamProfile {
    efficiency: f64,
    positions: Vec<PositionDb>,
}

impl StreamProfile {
    /// Read the header and position db of every file.
    ///
    /// The aggregate efficiency is the uniform mean over files; a header
    /// value outside [0, 1] (including NaN) contributes 0 and logs a
    /// warning. Ragged or empty position arrays are fatal.
    pub fn load(files: &[PathBuf]) -> Result<Self, ContractError> {
        debug_assert!(!files.is_empty(), "profile needs at least one file");

        let total_files = files.len();
        let mut efficiency_sum = 0.0;
        let mut positions = Vec::with_capacity(total_files);

        for (index, path) in files.iter().enumerate() {
            let mut container = Container::open(path)?;

            let header: SourceHeader = container.read_record(SECTION_HEADER)?;
            if (0.0..=1.0).contains(&header.efficiency) {
                efficiency_sum += header.efficiency;
            } else {
                warn!(
                    file = %path.display(),
                    efficiency = header.efficiency,
                    "malformed efficiency, counting as 0"
                );
            }

            let db: PositionDb = container.read_record(SECTION_POSDB)?;
            if !db.is_consistent() {
                return Err(ContractError::store_corrupt(
                    path.display().to_string(),
                    "position database arrays disagree in length",
                ));
            }
            if db.is_empty() {
                return Err(ContractError::PositionDbEmpty {
                    path: path.display().to_string(),
                });
            }

            debug!(
                file = %path.display(),
                loaded = index + 1,
                total = total_files,
                events = db.len(),
                "header and position db loaded"
            );
            positions.push(db);
        }

        Ok(Self {
            efficiency: efficiency_sum / total_files as f64,
            positions,
        })
    }

    /// Mean efficiency over all files.
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn file_count(&self) -> usize {
        self.positions.len()
    }

    /// Stored event count of one file.
    pub fn events_in_file(&self, file_index: usize) -> Option<usize> {
        self.positions.get(file_index).map(|db| db.len())
    }

    /// Position of one stored event.
    pub fn position(&self, file_index: usize, evt_index: usize) -> Option<Position> {
        self.positions.get(file_index)?.get(evt_index)
    }
}
