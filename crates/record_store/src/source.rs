//! Source container writing
//!
//! Source files normally come from the upstream simulation chain; this
//! writer exists for fixture generation and for re-packing records into the
//! container layout the merger reads.

use std::path::Path;

use bytes::Bytes;

use contracts::{ContractError, Position};

use crate::container::ContainerWriter;
use crate::format::{PositionDb, SourceHeader, SECTION_HEADER, SECTION_POSDB, SECTION_RUN_INFO};

/// Builds one source container: payloads plus their interaction positions.
pub struct SourceFileWriter {
    inner: ContainerWriter,
    events_section: String,
    payloads: Vec<Bytes>,
    positions: PositionDb,
}

impl SourceFileWriter {
    pub fn create(path: &Path, events_section: &str) -> Result<Self, ContractError> {
        Ok(Self {
            inner: ContainerWriter::create(path)?,
            events_section: events_section.to_string(),
            payloads: Vec::new(),
            positions: PositionDb::default(),
        })
    }

    /// Append one event: opaque payload plus its position-database entry.
    ///
    /// Keeping both in one call guarantees the position db and the events
    /// table stay the same length.
    pub fn append(&mut self, payload: Bytes, position: Position) {
        self.payloads.push(payload);
        self.positions.push(position);
    }

    pub fn event_count(&self) -> usize {
        self.payloads.len()
    }

    /// Seal the container with its efficiency header and run metadata.
    pub fn finish(self, efficiency: f64, run_info: &[u8]) -> Result<(), ContractError> {
        let Self {
            mut inner,
            events_section,
            payloads,
            positions,
        } = self;

        inner.write_record(SECTION_HEADER, &SourceHeader { efficiency })?;
        inner.write_record(SECTION_POSDB, &positions)?;
        inner.write_section(SECTION_RUN_INFO, run_info)?;
        inner.write_events(&events_section, &payloads)?;
        inner.finish()
    }
}
