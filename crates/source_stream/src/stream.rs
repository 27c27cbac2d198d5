//! SourceStream - one component's event stream
//!
//! Holds what the scheduler needs eagerly (rate, efficiency, positions) and
//! defers payload bytes until the timeline is final: admissions accumulate
//! as (time, file, event) triples, `materialize` fetches them per file, and
//! `next_payload` hands them out in admission order.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use rand::Rng;
use tracing::{debug, info, instrument};

use contracts::{ComponentManifest, ContractError, PayloadCheck, Position, StreamClass, StreamName};
use record_store::RecordStore;

use crate::profile::StreamProfile;

/// One uniform draw from a stream: where the event lives and its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventDraw {
    pub file_index: usize,
    pub evt_index: usize,
    pub position: Position,
}

/// One admitted event awaiting materialization.
#[derive(Debug, Clone, Copy)]
struct Admission {
    time: f64,
    file_index: usize,
    evt_index: usize,
}

/// Per-component stream state.
#[derive(Debug)]
pub struct SourceStream {
    name: StreamName,
    class: StreamClass,
    rate: f64,
    files: Vec<PathBuf>,
    events_section: String,
    profile: StreamProfile,
    admissions: Vec<Admission>,
    pool: Vec<Bytes>,
    cursor: usize,
}

impl SourceStream {
    /// Build a stream from its resolved manifest.
    ///
    /// Reads every file's header and position db up front; the events
    /// tables are not touched.
    #[instrument(name = "source_stream_new", skip(manifest, events_section), fields(stream = %manifest.descriptor.name))]
    pub fn new(manifest: &ComponentManifest, events_section: &str) -> Result<Self, ContractError> {
        let descriptor = &manifest.descriptor;
        if manifest.files.is_empty() {
            return Err(ContractError::EmptySourceDir {
                component: descriptor.name.to_string(),
                path: descriptor.directory.clone(),
            });
        }

        let profile = StreamProfile::load(&manifest.files)?;
        info!(
            stream = %descriptor.name,
            class = ?descriptor.class,
            rate = descriptor.rate,
            efficiency = profile.efficiency(),
            files = manifest.files.len(),
            "source stream ready"
        );

        Ok(Self {
            name: descriptor.name.clone(),
            class: descriptor.class,
            rate: descriptor.rate,
            files: manifest.files.clone(),
            events_section: events_section.to_string(),
            profile,
            admissions: Vec::new(),
            pool: Vec::new(),
            cursor: 0,
        })
    }

    pub fn name(&self) -> &StreamName {
        &self.name
    }

    pub fn class(&self) -> StreamClass {
        self.class
    }

    /// True if the coincidence cut applies to this stream.
    pub fn is_single(&self) -> bool {
        self.class.is_single()
    }

    /// Nominal rate before efficiency thinning (events/second).
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Mean efficiency over the stream's files.
    pub fn efficiency(&self) -> f64 {
        self.profile.efficiency()
    }

    /// Thinned arrival rate used for interarrival sampling.
    pub fn effective_rate(&self) -> f64 {
        self.rate * self.profile.efficiency()
    }

    /// Number of source files backing the stream.
    pub fn entries(&self) -> usize {
        self.files.len()
    }

    /// First file in manifest order. Donor for run metadata cloning.
    pub fn first_file(&self) -> &Path {
        &self.files[0]
    }

    /// Admissions accumulated since the last reset.
    pub fn admitted(&self) -> usize {
        self.admissions.len()
    }

    /// Draw a uniform (file, event) pair and look up its position.
    ///
    /// Both picks floor a uniform draw scaled by the candidate count, so
    /// every stored event is equally likely regardless of file sizes
    /// within the chosen file.
    pub fn sample_position(&self, rng: &mut impl Rng) -> Result<EventDraw, ContractError> {
        let file_index = scaled_draw(rng, self.files.len());
        let events = self.profile.events_in_file(file_index).unwrap_or(0);
        if events == 0 {
            return Err(ContractError::PositionDbEmpty {
                path: self.files[file_index].display().to_string(),
            });
        }
        let evt_index = scaled_draw(rng, events);
        let position = self.profile.position(file_index, evt_index).ok_or_else(|| {
            ContractError::store_corrupt(
                self.files[file_index].display().to_string(),
                format!("position {evt_index} vanished from loaded db"),
            )
        })?;
        Ok(EventDraw {
            file_index,
            evt_index,
            position,
        })
    }

    /// Record an admitted event. O(1); no ordering requirement.
    pub fn push_admission(&mut self, time: f64, file_index: usize, evt_index: usize) {
        self.admissions.push(Admission {
            time,
            file_index,
            evt_index,
        });
    }

    /// Fetch every admitted payload, one store pass per file.
    ///
    /// Indices are grouped per file, sorted and deduplicated, fetched in a
    /// single forward sweep per store, then re-expanded into admission
    /// order. Duplicate admissions of the same stored event share one
    /// fetched payload.
    #[instrument(name = "materialize", skip(self, check), fields(stream = %self.name, admissions = self.admissions.len()))]
    pub fn materialize(&mut self, check: &dyn PayloadCheck) -> Result<(), ContractError> {
        let mut wanted: Vec<Vec<usize>> = vec![Vec::new(); self.files.len()];
        for admission in &self.admissions {
            wanted[admission.file_index].push(admission.evt_index);
        }
        for list in &mut wanted {
            list.sort_unstable();
            list.dedup();
        }

        let mut pools: Vec<Vec<Bytes>> = Vec::with_capacity(self.files.len());
        for (file_index, indices) in wanted.iter().enumerate() {
            if indices.is_empty() {
                pools.push(Vec::new());
                continue;
            }
            let mut store = RecordStore::open(&self.files[file_index], &self.events_section)?;
            let payloads = store.fetch_subset(indices, check)?;
            store.close();
            debug!(
                stream = %self.name,
                file = %self.files[file_index].display(),
                fetched = payloads.len(),
                "file subset fetched"
            );
            pools.push(payloads);
        }

        let mut pool = Vec::with_capacity(self.admissions.len());
        for admission in &self.admissions {
            let indices = &wanted[admission.file_index];
            let slot = indices.binary_search(&admission.evt_index).map_err(|_| {
                ContractError::Other(format!(
                    "admission for event {} of file {} missing from fetch plan",
                    admission.evt_index, admission.file_index
                ))
            })?;
            pool.push(pools[admission.file_index][slot].clone());
        }

        self.pool = pool;
        self.cursor = 0;
        debug!(stream = %self.name, payloads = self.pool.len(), "stream materialized");
        Ok(())
    }

    /// Next materialized payload, in admission order. Forward-only.
    pub fn next_payload(&mut self) -> Option<Bytes> {
        let payload = self.pool.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(payload)
    }

    /// Admission times in insertion order, for ordering checks.
    pub fn admission_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.admissions.iter().map(|a| a.time)
    }

    /// Clear admissions and the materialized pool.
    ///
    /// Efficiency and position databases survive; the stream is ready for
    /// the next dataset pass.
    pub fn reset(&mut self) {
        self.admissions.clear();
        self.pool.clear();
        self.cursor = 0;
    }
}

/// Floor of a uniform draw scaled to `n`, clamped into range.
fn scaled_draw(rng: &mut impl Rng, n: usize) -> usize {
    let raw = (rng.random::<f64>() * n as f64) as usize;
    raw.min(n.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ComponentDescriptor, PermissiveCheck};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use record_store::SourceFileWriter;
    use tempfile::tempdir;

    fn write_source(path: &Path, efficiency: f64, payloads: &[&[u8]]) {
        let mut writer = SourceFileWriter::create(path, "events").unwrap();
        for (i, payload) in payloads.iter().enumerate() {
            writer.append(
                Bytes::copy_from_slice(payload),
                Position::new(i as f64 * 100.0, 0.0, 0.0),
            );
        }
        writer.finish(efficiency, b"run").unwrap();
    }

    fn make_manifest(name: &str, files: Vec<PathBuf>) -> ComponentManifest {
        ComponentManifest {
            descriptor: ComponentDescriptor {
                name: name.into(),
                directory: name.to_string(),
                rate: 0.5,
                class: StreamClass::Single,
            },
            files,
        }
    }

    fn two_file_stream(dir: &Path) -> SourceStream {
        let a = dir.join("a.evd");
        let b = dir.join("b.evd");
        write_source(&a, 0.8, &[b"a0", b"a1", b"a2"]);
        write_source(&b, 0.4, &[b"b0", b"b1"]);
        SourceStream::new(&make_manifest("li9", vec![a, b]), "events").unwrap()
    }

    #[test]
    fn construction_loads_profile() {
        let tmp = tempdir().unwrap();
        let stream = two_file_stream(tmp.path());
        assert_eq!(stream.entries(), 2);
        assert!((stream.efficiency() - 0.6).abs() < 1e-12);
        assert!((stream.effective_rate() - 0.3).abs() < 1e-12);
        assert!(stream.is_single());
    }

    #[test]
    fn sample_position_stays_in_range() {
        let tmp = tempdir().unwrap();
        let stream = two_file_stream(tmp.path());
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let draw = stream.sample_position(&mut rng).unwrap();
            assert!(draw.file_index < 2);
            let events = if draw.file_index == 0 { 3 } else { 2 };
            assert!(draw.evt_index < events);
            assert_eq!(draw.position.x, draw.evt_index as f64 * 100.0);
        }
    }

    #[test]
    fn sample_position_is_deterministic_for_a_seed() {
        let tmp = tempdir().unwrap();
        let stream = two_file_stream(tmp.path());

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let a = stream.sample_position(&mut rng_a).unwrap();
            let b = stream.sample_position(&mut rng_b).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn materialize_restores_admission_order() {
        let tmp = tempdir().unwrap();
        let mut stream = two_file_stream(tmp.path());

        // Cross-file, out-of-store-order, with a duplicate
        stream.push_admission(0.10, 1, 1); // b1
        stream.push_admission(0.25, 0, 2); // a2
        stream.push_admission(0.50, 0, 0); // a0
        stream.push_admission(0.75, 1, 1); // b1 again
        stream.materialize(&PermissiveCheck).unwrap();

        assert_eq!(stream.next_payload().unwrap().as_ref(), b"b1");
        assert_eq!(stream.next_payload().unwrap().as_ref(), b"a2");
        assert_eq!(stream.next_payload().unwrap().as_ref(), b"a0");
        assert_eq!(stream.next_payload().unwrap().as_ref(), b"b1");
        assert!(stream.next_payload().is_none());
    }

    #[test]
    fn materialize_with_no_admissions_is_empty() {
        let tmp = tempdir().unwrap();
        let mut stream = two_file_stream(tmp.path());
        stream.materialize(&PermissiveCheck).unwrap();
        assert!(stream.next_payload().is_none());
    }

    #[test]
    fn reset_clears_admissions_but_keeps_profile() {
        let tmp = tempdir().unwrap();
        let mut stream = two_file_stream(tmp.path());

        stream.push_admission(0.1, 0, 0);
        stream.materialize(&PermissiveCheck).unwrap();
        assert_eq!(stream.admitted(), 1);

        stream.reset();
        assert_eq!(stream.admitted(), 0);
        assert!(stream.next_payload().is_none());
        assert!((stream.efficiency() - 0.6).abs() < 1e-12);

        // Stream is reusable after reset
        stream.push_admission(0.2, 1, 0);
        stream.materialize(&PermissiveCheck).unwrap();
        assert_eq!(stream.next_payload().unwrap().as_ref(), b"b0");
    }

    #[test]
    fn empty_manifest_is_fatal() {
        let manifest = make_manifest("empty", Vec::new());
        let err = SourceStream::new(&manifest, "events").unwrap_err();
        assert!(matches!(err, ContractError::EmptySourceDir { .. }));
    }
}
