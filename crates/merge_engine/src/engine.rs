//! Scheduling loop and dataset assembly.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};

use contracts::{
    ComponentManifest, ContractError, CutConfig, DatasetSummary, MergedEvent, PayloadCheck,
    PermissiveCheck,
};
use record_store::{Container, DatasetWriter, SECTION_RUN_INFO};
use source_stream::SourceStream;

use crate::table::AdmissionTable;
use crate::window::{AdmissionWindow, Candidate};

/// Drives one merge campaign: interarrival sampling across all streams,
/// the rolling admission filter, and final dataset assembly.
pub struct MergeEngine {
    /// Component streams, in configuration order.
    streams: Vec<SourceStream>,
    /// Coincidence cut thresholds.
    cuts: CutConfig,
    /// Events table name used for source reads and dataset writes alike.
    events_section: String,
    /// Payload integrity policy applied during materialization.
    check: Box<dyn PayloadCheck>,
    /// Seeded generator; owns every random draw the engine makes.
    rng: StdRng,
    /// Global clock, elapsed seconds since the dataset began.
    clock: f64,
    /// Rolling admission state, one step behind the clock.
    window: AdmissionWindow,
    /// Time-ordered admissions for the current dataset.
    table: AdmissionTable,
    scheduled: u64,
    admitted: u64,
    discarded: u64,
}

// Manual impl: `check` is a `Box<dyn PayloadCheck>`, which has no `Debug` bound.
impl std::fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine")
            .field("cuts", &self.cuts)
            .field("events_section", &self.events_section)
            .field("check", &self.check.name())
            .field("clock", &self.clock)
            .field("scheduled", &self.scheduled)
            .field("admitted", &self.admitted)
            .field("discarded", &self.discarded)
            .finish_non_exhaustive()
    }
}

impl MergeEngine {
    /// Build an engine over resolved component manifests.
    ///
    /// Loads every stream's header and position database eagerly and
    /// rejects any stream whose thinned rate cannot drive exponential
    /// sampling.
    #[instrument(
        name = "merge_engine_new",
        skip(manifests, cuts, events_section),
        fields(components = manifests.len(), seed)
    )]
    pub fn new(
        manifests: &[ComponentManifest],
        cuts: CutConfig,
        events_section: &str,
        seed: u64,
    ) -> Result<Self, ContractError> {
        if manifests.is_empty() {
            return Err(ContractError::config_validation(
                "components",
                "at least one component stream is required",
            ));
        }

        let mut streams = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            let stream = SourceStream::new(manifest, events_section)?;
            let effective = stream.effective_rate();
            if !effective.is_finite() || effective <= 0.0 {
                return Err(ContractError::DegenerateRate {
                    stream: stream.name().to_string(),
                    rate: stream.rate(),
                    efficiency: stream.efficiency(),
                });
            }
            streams.push(stream);
        }

        info!(streams = streams.len(), seed, "merge engine ready");
        Ok(Self {
            streams,
            cuts,
            events_section: events_section.to_string(),
            check: Box::new(PermissiveCheck),
            rng: StdRng::seed_from_u64(seed),
            clock: 0.0,
            window: AdmissionWindow::default(),
            table: AdmissionTable::default(),
            scheduled: 0,
            admitted: 0,
            discarded: 0,
        })
    }

    /// Swap in a payload integrity policy.
    pub fn with_check(mut self, check: Box<dyn PayloadCheck>) -> Self {
        self.check = check;
        self
    }

    /// Current global clock (seconds of simulated live time).
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn table(&self) -> &AdmissionTable {
        &self.table
    }

    pub fn streams(&self) -> &[SourceStream] {
        &self.streams
    }

    /// Advance the schedule by one event and judge the previous candidate.
    ///
    /// Draws one interarrival per stream, commits the earliest, samples
    /// the winner's position, then runs the admission filter on the
    /// candidate buffered one step earlier. Returns the new clock value.
    #[instrument(level = "trace", name = "next_event", skip(self))]
    pub fn next_event(&mut self) -> Result<f64, ContractError> {
        let mut winner = 0usize;
        let mut shortest = f64::INFINITY;
        for (index, stream) in self.streams.iter().enumerate() {
            // Clamp keeps the draw strictly inside (0, 1); at exactly 1.0
            // the log would blow up to an infinite interarrival.
            let u = self
                .rng
                .random::<f64>()
                .clamp(f64::EPSILON, 1.0 - f64::EPSILON);
            let dt = -(1.0 - u).ln() / stream.effective_rate();
            if dt < shortest {
                shortest = dt;
                winner = index;
            }
        }

        self.clock += shortest;
        self.scheduled += 1;
        metrics::counter!("pileup_scheduled_total").increment(1);
        metrics::histogram!("pileup_interarrival_seconds").record(shortest);

        let draw = self.streams[winner].sample_position(&mut self.rng)?;
        let chosen = Candidate {
            time: self.clock,
            stream: winner,
            file_index: draw.file_index,
            evt_index: draw.evt_index,
            position: draw.position,
            single: self.streams[winner].is_single(),
        };

        let had_pending = self.window.has_pending();
        let (window, verdict) = self.window.advance(chosen, &self.cuts);
        self.window = window;

        match verdict {
            Some(event) => {
                self.streams[event.stream].push_admission(
                    event.time,
                    event.file_index,
                    event.evt_index,
                );
                self.table.push(event.time, event.stream);
                self.admitted += 1;
                metrics::counter!(
                    "pileup_admitted_total",
                    "stream" => self.streams[event.stream].name().to_string()
                )
                .increment(1);
            }
            None if had_pending => {
                self.discarded += 1;
                metrics::counter!("pileup_discarded_total").increment(1);
            }
            None => {}
        }

        Ok(self.clock)
    }

    /// Run the scheduler until the clock passes `live_time` seconds.
    #[instrument(name = "run_schedule", skip(self), fields(live_time))]
    pub fn run_until(&mut self, live_time: f64) -> Result<f64, ContractError> {
        while self.clock < live_time {
            self.next_event()?;
        }
        debug!(
            clock = self.clock,
            scheduled = self.scheduled,
            admitted = self.admitted,
            discarded = self.discarded,
            "schedule complete"
        );
        Ok(self.clock)
    }

    /// Materialize every admitted payload and write one merged dataset.
    ///
    /// Payloads are fetched per stream only after scheduling ends, so each
    /// store sees one sorted pass. Admissions whose payload came back
    /// empty are skipped at write time but still consume their stream's
    /// cursor, keeping later admissions aligned. The engine resets itself
    /// afterwards for the next dataset.
    #[instrument(name = "build_dataset", skip(self, path), fields(path = %path.display()))]
    pub fn build_dataset(&mut self, path: &Path) -> Result<DatasetSummary, ContractError> {
        for stream in &mut self.streams {
            stream.materialize(self.check.as_ref())?;
        }

        let run_info = self.clone_run_info()?;

        // A failed write must not leave a half-written container behind.
        let (written, skipped) = match self.write_records(path, &run_info) {
            Ok(counts) => counts,
            Err(e) => {
                let _ = std::fs::remove_file(path);
                return Err(e);
            }
        };

        let livetime = self.clock;
        metrics::counter!("pileup_datasets_total").increment(1);
        metrics::histogram!("pileup_livetime_seconds").record(livetime);

        let summary = DatasetSummary {
            path: path.to_path_buf(),
            livetime,
            scheduled: self.scheduled,
            admitted: self.admitted,
            discarded: self.discarded,
            written,
            skipped_payloads: skipped,
        };

        self.reset();
        Ok(summary)
    }

    /// Drain the admission table into a dataset container on disk.
    fn write_records(&mut self, path: &Path, run_info: &[u8]) -> Result<(u64, u64), ContractError> {
        let mut writer = DatasetWriter::create(path, &self.events_section)?;
        let mut skipped = 0u64;
        for (index, record) in self.table.records().iter().enumerate() {
            let stream = &mut self.streams[record.stream];
            let payload = stream
                .next_payload()
                .ok_or_else(|| ContractError::CursorExhausted {
                    stream: stream.name().to_string(),
                    admission: index,
                })?;

            if payload.is_empty() {
                skipped += 1;
                debug!(stream = %stream.name(), admission = index, "empty payload skipped");
                continue;
            }

            let (utc_secs, utc_nanos) = split_timestamp(record.time);
            writer.append(&MergedEvent {
                utc_secs,
                utc_nanos,
                source: stream.name().clone(),
                payload,
            })?;
        }

        let written = writer.finish(self.clock, run_info)?;
        Ok((written, skipped))
    }

    /// Run metadata cloned verbatim from the first file of the first
    /// configured stream.
    fn clone_run_info(&self) -> Result<Vec<u8>, ContractError> {
        let donor = self.streams[0].first_file();
        let mut container = Container::open(donor)?;
        container.read_section(SECTION_RUN_INFO)
    }

    /// Zero the clock and clear per-dataset state. Streams keep their
    /// headers and position databases.
    fn reset(&mut self) {
        for stream in &mut self.streams {
            stream.reset();
        }
        self.table.clear();
        self.window = AdmissionWindow::default();
        self.clock = 0.0;
        self.scheduled = 0;
        self.admitted = 0;
        self.discarded = 0;
    }
}

/// Split an elapsed-seconds clock value into epoch-anchored UTC parts.
fn split_timestamp(elapsed: f64) -> (i64, u32) {
    let secs = elapsed.floor();
    let nanos = ((elapsed - secs) * 1e9) as u32;
    (secs as i64, nanos)
}
