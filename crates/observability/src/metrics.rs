//! Merge campaign metric collection.
//!
//! Records per-dataset outcomes to the metrics recorder and aggregates
//! them in memory for the end-of-campaign summary.

use contracts::DatasetSummary;
use metrics::{counter, gauge, histogram};

/// Record metrics from one dataset build.
///
/// Call once per completed dataset.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dataset_metrics;
///
/// let summary = engine.build_dataset(&path)?;
/// record_dataset_metrics(&summary, index);
/// ```
pub fn record_dataset_metrics(summary: &DatasetSummary, dataset_index: u32) {
    counter!("pileup_merger_datasets_total").increment(1);

    // Dataset index (spots gaps in a batch)
    gauge!("pileup_merger_last_dataset_index").set(dataset_index as f64);

    histogram!("pileup_merger_livetime_seconds").record(summary.livetime);
    histogram!("pileup_merger_events_written").record(summary.written as f64);
    histogram!("pileup_merger_admission_ratio").record(summary.admission_ratio());

    counter!("pileup_merger_events_scheduled_total").increment(summary.scheduled);
    counter!("pileup_merger_events_admitted_total").increment(summary.admitted);

    if summary.discarded > 0 {
        counter!("pileup_merger_events_discarded_total").increment(summary.discarded);
    }
    gauge!("pileup_merger_events_discarded_current").set(summary.discarded as f64);

    if summary.skipped_payloads > 0 {
        counter!("pileup_merger_payloads_skipped_total").increment(summary.skipped_payloads);
    }
    gauge!("pileup_merger_payloads_skipped_current").set(summary.skipped_payloads as f64);
}

/// Record one stream's admission count for the current dataset.
pub fn record_stream_admissions(stream: &str, admitted: u64) {
    counter!(
        "pileup_merger_stream_admissions_total",
        "stream" => stream.to_string()
    )
    .increment(admitted);

    gauge!(
        "pileup_merger_stream_admissions",
        "stream" => stream.to_string()
    )
    .set(admitted as f64);
}

/// Record the wall-clock duration of one dataset build.
pub fn record_build_duration_ms(duration_ms: f64) {
    histogram!("pileup_merger_build_duration_ms").record(duration_ms);
}

/// Merge metric aggregator.
///
/// Accumulates dataset summaries in memory so the CLI can print a
/// campaign report at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct MergeMetricsAggregator {
    /// Datasets completed
    pub total_datasets: u64,

    /// Candidates drawn across all datasets
    pub total_scheduled: u64,

    /// Candidates admitted across all datasets
    pub total_admitted: u64,

    /// Candidates discarded by the coincidence filter
    pub total_discarded: u64,

    /// Events written to disk
    pub total_written: u64,

    /// Payloads replaced by placeholders and left out
    pub total_skipped_payloads: u64,

    /// Live time statistics (seconds per dataset)
    pub livetime_stats: RunningStats,

    /// Events written per dataset
    pub written_stats: RunningStats,

    /// Admission ratio per dataset
    pub ratio_stats: RunningStats,

    /// Admissions per stream, summed across datasets
    pub stream_admissions: std::collections::HashMap<String, u64>,
}

impl MergeMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one dataset summary into the aggregate.
    pub fn update(&mut self, summary: &DatasetSummary) {
        self.total_datasets += 1;
        self.total_scheduled += summary.scheduled;
        self.total_admitted += summary.admitted;
        self.total_discarded += summary.discarded;
        self.total_written += summary.written;
        self.total_skipped_payloads += summary.skipped_payloads;

        self.livetime_stats.push(summary.livetime);
        self.written_stats.push(summary.written as f64);
        self.ratio_stats.push(summary.admission_ratio());
    }

    /// Add one stream's admission count for the dataset being folded.
    pub fn record_stream(&mut self, stream: &str, admitted: u64) {
        *self.stream_admissions.entry(stream.to_string()).or_insert(0) += admitted;
    }

    /// Produce the campaign summary report.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_datasets: self.total_datasets,
            total_scheduled: self.total_scheduled,
            total_admitted: self.total_admitted,
            total_discarded: self.total_discarded,
            total_written: self.total_written,
            total_skipped_payloads: self.total_skipped_payloads,
            discard_rate: if self.total_scheduled > 0 {
                self.total_discarded as f64 / self.total_scheduled as f64 * 100.0
            } else {
                0.0
            },
            livetime_seconds: StatsSummary::from(&self.livetime_stats),
            events_per_dataset: StatsSummary::from(&self.written_stats),
            admission_ratio: StatsSummary::from(&self.ratio_stats),
            stream_admissions: self.stream_admissions.clone(),
        }
    }

    /// Reset all aggregates.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Campaign metric summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_datasets: u64,
    pub total_scheduled: u64,
    pub total_admitted: u64,
    pub total_discarded: u64,
    pub total_written: u64,
    pub total_skipped_payloads: u64,
    pub discard_rate: f64,
    pub livetime_seconds: StatsSummary,
    pub events_per_dataset: StatsSummary,
    pub admission_ratio: StatsSummary,
    pub stream_admissions: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Merge Metrics Summary ===")?;
        writeln!(f, "Datasets: {}", self.total_datasets)?;
        writeln!(f, "Scheduled candidates: {}", self.total_scheduled)?;
        writeln!(
            f,
            "Discarded by coincidence cut: {} ({:.2}%)",
            self.total_discarded, self.discard_rate
        )?;
        writeln!(f, "Events written: {}", self.total_written)?;
        if self.total_skipped_payloads > 0 {
            writeln!(f, "Payloads skipped: {}", self.total_skipped_payloads)?;
        }
        writeln!(f, "Live time (s): {}", self.livetime_seconds)?;
        writeln!(f, "Events per dataset: {}", self.events_per_dataset)?;
        writeln!(f, "Admission ratio: {}", self.admission_ratio)?;

        if !self.stream_admissions.is_empty() {
            writeln!(f, "Admissions by stream:")?;
            let mut streams: Vec<_> = self.stream_admissions.iter().collect();
            streams.sort_by(|a, b| a.0.cmp(b.0));
            for (stream, count) in streams {
                writeln!(f, "  {}: {}", stream, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_summary() -> DatasetSummary {
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
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = MergeMetricsAggregator::new();

        aggregator.update(&sample_summary());
        aggregator.record_stream("ibd", 150);
        aggregator.record_stream("li9", 250);
        aggregator.record_stream("ibd", 10);

        assert_eq!(aggregator.total_datasets, 1);
        assert_eq!(aggregator.total_scheduled, 1000);
        assert_eq!(aggregator.total_written, 398);
        assert_eq!(aggregator.stream_admissions.get("ibd"), Some(&160));
        assert_eq!(aggregator.stream_admissions.get("li9"), Some(&250));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = MergeMetricsAggregator::new();
        aggregator.update(&sample_summary());
        aggregator.update(&sample_summary());

        let summary = aggregator.summary();
        assert_eq!(summary.total_datasets, 2);
        assert!((summary.discard_rate - 59.9).abs() < 1e-9);

        let output = format!("{}", summary);
        assert!(output.contains("Datasets: 2"));
        assert!(output.contains("59.90%"));
        assert!(output.contains("mean=3600.000"));
    }
}
