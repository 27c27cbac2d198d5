//! Merged dataset writing and reading

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use contracts::{ContractError, MergedEvent};

use crate::container::{Container, ContainerWriter};
use crate::format::{DatasetHeader, SECTION_MERGE_INFO, SECTION_RUN_INFO};

/// Writes one merged dataset container.
///
/// Events are appended in admission order; `finish` stamps the livetime
/// header, clones the run metadata, and seals the file.
pub struct DatasetWriter {
    inner: ContainerWriter,
    events_section: String,
    encoded: Vec<Vec<u8>>,
}

impl DatasetWriter {
    pub fn create(path: &Path, events_section: &str) -> Result<Self, ContractError> {
        Ok(Self {
            inner: ContainerWriter::create(path)?,
            events_section: events_section.to_string(),
            encoded: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Events appended so far.
    pub fn event_count(&self) -> u64 {
        self.encoded.len() as u64
    }

    /// Append one merged event.
    pub fn append(&mut self, event: &MergedEvent) -> Result<(), ContractError> {
        let blob = bincode::serialize(event).map_err(|e| {
            ContractError::store_corrupt(
                self.inner.path().display().to_string(),
                format!("encode merged event: {e}"),
            )
        })?;
        self.encoded.push(blob);
        Ok(())
    }

    /// Seal the dataset: livetime header, run metadata, events table.
    pub fn finish(self, livetime: f64, run_info: &[u8]) -> Result<u64, ContractError> {
        let Self {
            mut inner,
            events_section,
            encoded,
        } = self;

        let header = DatasetHeader {
            livetime,
            event_count: encoded.len() as u64,
        };
        inner.write_record(SECTION_MERGE_INFO, &header)?;
        inner.write_section(SECTION_RUN_INFO, run_info)?;
        inner.write_events(&events_section, &encoded)?;

        let path = inner.path().display().to_string();
        inner.finish()?;
        info!(
            path,
            livetime,
            events = header.event_count,
            "merged dataset written"
        );
        Ok(header.event_count)
    }
}

/// Reads a merged dataset back for inspection or verification.
pub struct DatasetReader {
    container: Container,
    header: DatasetHeader,
    events_section: String,
}

impl DatasetReader {
    pub fn open(path: &Path, events_section: &str) -> Result<Self, ContractError> {
        let mut container = Container::open(path)?;
        let header: DatasetHeader = container.read_record(SECTION_MERGE_INFO)?;
        debug!(path = %path.display(), livetime = header.livetime, "dataset opened");
        Ok(Self {
            container,
            header,
            events_section: events_section.to_string(),
        })
    }

    pub fn header(&self) -> DatasetHeader {
        self.header
    }

    /// Run metadata cloned from the source files.
    pub fn run_info(&mut self) -> Result<Vec<u8>, ContractError> {
        self.container.read_section(SECTION_RUN_INFO)
    }

    /// Decode every merged event, in admission order.
    pub fn events(&mut self) -> Result<Vec<MergedEvent>, ContractError> {
        let section = self.events_section.clone();
        let bytes = self.container.read_section(&section)?;
        decode_events_table(&bytes, self.container.path())
    }
}

fn decode_events_table(bytes: &[u8], path: &Path) -> Result<Vec<MergedEvent>, ContractError> {
    let corrupt = |message: String| {
        ContractError::store_corrupt(path.display().to_string(), message)
    };

    if bytes.len() < 8 {
        return Err(corrupt("events table shorter than its count".into()));
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    let count = u64::from_le_bytes(word) as usize;

    let index_end = 8 + (count + 1) * 8;
    if bytes.len() < index_end {
        return Err(corrupt(format!("events index truncated at {count} entries")));
    }
    let offset_at = |i: usize| -> u64 {
        let mut w = [0u8; 8];
        w.copy_from_slice(&bytes[8 + i * 8..16 + i * 8]);
        u64::from_le_bytes(w)
    };

    let blobs = &bytes[index_end..];
    let mut events = Vec::with_capacity(count);
    for i in 0..count {
        let start = offset_at(i) as usize;
        let end = offset_at(i + 1) as usize;
        if start > end || end > blobs.len() {
            return Err(corrupt(format!("event {i} spans {start}..{end} outside blob area")));
        }
        let event: MergedEvent = bincode::deserialize(&blobs[start..end])
            .map_err(|e| corrupt(format!("decode merged event {i}: {e}")))?;
        events.push(event);
    }
    Ok(events)
}

/// UTC timestamp of a merged event, if representable.
pub fn event_timestamp(event: &MergedEvent) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(event.utc_secs, event.utc_nanos)
}
