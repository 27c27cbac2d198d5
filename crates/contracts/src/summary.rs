//! Outcome summaries reported by the merge engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one dataset build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Where the dataset was written.
    pub path: PathBuf,
    /// Simulated elapsed live time covered by the dataset (seconds).
    pub livetime: f64,
    /// Candidates drawn by the scheduler.
    pub scheduled: u64,
    /// Candidates that passed the coincidence filter.
    pub admitted: u64,
    /// Candidates rejected as isolated singles.
    pub discarded: u64,
    /// Events actually written to the dataset.
    pub written: u64,
    /// Admissions whose payload failed its check and was left out.
    pub skipped_payloads: u64,
}

impl DatasetSummary {
    /// Fraction of scheduled candidates that survived the filter.
    pub fn admission_ratio(&self) -> f64 {
        if self.scheduled == 0 {
            0.0
        } else {
            self.admitted as f64 / self.scheduled as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DatasetSummary {
        DatasetSummary {
            path: PathBuf::from("/out/mergedfile_0.evd"),
            livetime: 3600.0,
            scheduled: 1000,
            admitted: 400,
            discarded: 599,
            written: 398,
            skipped_payloads: 2,
        }
    }

    #[test]
    fn admission_ratio_handles_zero_scheduled() {
        let mut summary = sample();
        assert!((summary.admission_ratio() - 0.4).abs() < 1e-12);

        summary.scheduled = 0;
        assert_eq!(summary.admission_ratio(), 0.0);
    }

    #[test]
    fn summary_round_trips_as_json() {
        let summary = sample();
        let json = serde_json::to_string(&summary).unwrap();
        let back: DatasetSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scheduled, 1000);
        assert_eq!(back.path, summary.path);
    }
}
