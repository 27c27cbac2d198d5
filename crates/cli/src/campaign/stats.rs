//! Campaign statistics and metrics.

use std::time::Duration;

use observability::MergeMetricsAggregator;

/// Statistics from a merge campaign
#[derive(Debug, Clone, Default)]
pub struct CampaignStats {
    /// Datasets successfully written to disk
    pub datasets_written: u64,

    /// Total events written across all datasets
    pub events_written: u64,

    /// Total payloads skipped by materialization checks
    pub events_skipped: u64,

    /// Total simulated live time in seconds
    pub total_live_time: f64,

    /// Wall-clock duration of the campaign
    pub duration: Duration,

    /// Merge metric aggregator
    pub merge_metrics: MergeMetricsAggregator,
}

impl CampaignStats {
    /// Calculate written events per wall-clock second
    pub fn events_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Campaign Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Datasets written: {}", self.datasets_written);
        println!("   ├─ Events written: {}", self.events_written);
        if self.events_skipped > 0 {
            println!("   ├─ Payloads skipped: {}", self.events_skipped);
        }
        println!("   ├─ Simulated live time: {:.1}s", self.total_live_time);
        println!("   └─ Throughput: {:.2} events/s", self.events_per_second());

        let summary = self.merge_metrics.summary();

        println!("\nCoincidence Filter");
        println!("   ├─ Scheduled candidates: {}", summary.total_scheduled);
        println!(
            "   ├─ Discarded: {} ({:.2}%)",
            summary.total_discarded, summary.discard_rate
        );
        println!("   ├─ Admitted: {}", summary.total_admitted);
        println!("   ├─ Admission ratio: {}", summary.admission_ratio);
        println!("   └─ Live time (s): {}", summary.livetime_seconds);

        if !summary.stream_admissions.is_empty() {
            println!("\nAdmissions by Stream");
            let mut streams: Vec<_> = summary.stream_admissions.iter().collect();
            streams.sort_by(|a, b| a.0.cmp(b.0));
            for (i, (stream, count)) in streams.iter().enumerate() {
                let prefix = if i == streams.len() - 1 { "└─" } else { "├─" };
                println!("   {} {}: {}", prefix, stream, count);
            }
        }

        println!();
    }
}
