//! RecordStore - deferred event retrieval
//!
//! Binds one container's events table. Opened only when a stream
//! materializes its admissions, used for a single fetch pass, then closed.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use contracts::{ContractError, PayloadCheck};

use crate::container::Container;

/// One open events table.
#[derive(Debug)]
pub struct RecordStore {
    container: Container,
    events_offset: u64,
    events_len: u64,
    entries: u64,
}

impl RecordStore {
    /// Open a container and bind its events table.
    ///
    /// # Errors
    /// - container unreadable or corrupt
    /// - events section absent
    /// - events index truncated
    pub fn open(path: &Path, events_section: &str) -> Result<Self, ContractError> {
        let mut container = Container::open(path)?;
        let (events_offset, events_len) = match container.section(events_section) {
            Some(entry) => (entry.offset, entry.len),
            None => {
                return Err(ContractError::SectionMissing {
                    path: path.display().to_string(),
                    section: events_section.to_string(),
                })
            }
        };

        let mut long = [0u8; 8];
        container.read_exact_at(events_offset, &mut long)?;
        let entries = u64::from_le_bytes(long);

        let index_len = 8 + (entries + 1) * 8;
        if events_len < index_len {
            return Err(ContractError::store_corrupt(
                path.display().to_string(),
                format!("events index truncated: {entries} entries in {events_len} bytes"),
            ));
        }

        debug!(path = %path.display(), entries, "record store opened");
        Ok(Self {
            container,
            events_offset,
            events_len,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        self.container.path()
    }

    /// Number of events in the table.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Fetch the payloads at `indices`.
    ///
    /// `indices` must be deduplicated and sorted ascending; retrieval is then
    /// a forward-only sweep over the table. Each payload passes through
    /// `check`; failures are replaced by an empty placeholder so the result
    /// stays index-aligned with the request.
    #[instrument(name = "fetch_subset", skip(self, indices, check), fields(path = %self.container.path().display(), requested = indices.len()))]
    pub fn fetch_subset(
        &mut self,
        indices: &[usize],
        check: &dyn PayloadCheck,
    ) -> Result<Vec<Bytes>, ContractError> {
        debug_assert!(
            indices.windows(2).all(|w| w[0] < w[1]),
            "indices must be sorted ascending and deduplicated"
        );
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(&max) = indices.last() {
            if max as u64 >= self.entries {
                return Err(ContractError::EventIndexOutOfRange {
                    path: self.path().display().to_string(),
                    index: max,
                    entries: self.entries,
                });
            }
        }

        let index_base = self.events_offset + 8;
        let blob_base = index_base + (self.entries + 1) * 8;
        let blob_area_len = self.events_len - 8 - (self.entries + 1) * 8;

        // Pass 1: the offset pairs, ascending through the index region.
        let mut spans = Vec::with_capacity(indices.len());
        for &index in indices {
            let mut pair = [0u8; 16];
            self.container
                .read_exact_at(index_base + (index as u64) * 8, &mut pair)?;
            let mut word = [0u8; 8];
            word.copy_from_slice(&pair[..8]);
            let start = u64::from_le_bytes(word);
            word.copy_from_slice(&pair[8..]);
            let end = u64::from_le_bytes(word);
            if start > end || end > blob_area_len {
                return Err(ContractError::store_corrupt(
                    self.path().display().to_string(),
                    format!("event {index} spans {start}..{end} outside blob area"),
                ));
            }
            spans.push((start, end));
        }

        // Pass 2: the blobs, ascending through the blob area.
        let mut payloads = Vec::with_capacity(indices.len());
        for (&index, &(start, end)) in indices.iter().zip(&spans) {
            let mut buf = vec![0u8; (end - start) as usize];
            self.container.read_exact_at(blob_base + start, &mut buf)?;
            if check.ok(&buf) {
                payloads.push(Bytes::from(buf));
            } else {
                warn!(
                    path = %self.path().display(),
                    index,
                    check = check.name(),
                    "payload failed integrity check, substituting placeholder"
                );
                payloads.push(Bytes::new());
            }
        }
        Ok(payloads)
    }

    /// Release the underlying file handle.
    pub fn close(self) {
        debug!(path = %self.path().display(), "record store closed");
    }
}
