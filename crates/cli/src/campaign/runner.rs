//! Campaign runner - builds datasets one after another.
//!
//! Each dataset gets a fresh engine seeded from the campaign seed plus the
//! dataset index, so any single file can be reproduced in isolation with
//! `--start-index N --num-datasets 1 --seed S`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ComponentManifest, ContractError, DatasetSummary, MergeBlueprint};
use merge_engine::MergeEngine;
use observability::{
    record_build_duration_ms, record_dataset_metrics, record_stream_admissions,
    MergeMetricsAggregator,
};
use record_store::CONTAINER_EXTENSION;
use tracing::info;

use super::CampaignStats;
use crate::error::CliError;

/// Campaign configuration
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// The merge blueprint
    pub blueprint: MergeBlueprint,

    /// Resolved source manifests, one per component
    pub manifests: Vec<ComponentManifest>,

    /// Number of datasets to produce
    pub num_datasets: u32,

    /// Index of the first dataset file
    pub start_index: u32,

    /// Simulated live time per dataset in seconds
    pub live_time: f64,

    /// Campaign seed; each dataset offsets it by its index
    pub seed: u64,
}

/// Merge campaign driver
pub struct Campaign {
    config: CampaignConfig,
}

impl Campaign {
    /// Create a new campaign with the given configuration
    pub fn new(config: CampaignConfig) -> Self {
        Self { config }
    }

    /// Run the campaign to completion
    pub fn run(self) -> Result<CampaignStats> {
        let start_time = Instant::now();
        let config = &self.config;

        std::fs::create_dir_all(&config.blueprint.storage.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.blueprint.storage.output_dir
            )
        })?;

        let mut stats = CampaignStats::default();
        let mut aggregator = MergeMetricsAggregator::new();

        for offset in 0..config.num_datasets {
            let index = config.start_index + offset;
            let path = self.dataset_path(index);
            let dataset_seed = config.seed.wrapping_add(u64::from(index));

            info!(
                index,
                path = %path.display(),
                seed = dataset_seed,
                "Building dataset"
            );

            let build_start = Instant::now();
            let summary = self
                .build_one(&path, dataset_seed, &mut aggregator)
                .map_err(|e| CliError::merge_failed(index, e))?;
            record_build_duration_ms(build_start.elapsed().as_secs_f64() * 1000.0);

            info!(
                index,
                events = summary.written,
                discarded = summary.discarded,
                livetime = summary.livetime,
                "Dataset complete"
            );

            stats.datasets_written += 1;
            stats.events_written += summary.written;
            stats.events_skipped += summary.skipped_payloads;
            stats.total_live_time += summary.livetime;

            record_dataset_metrics(&summary, index);
            aggregator.update(&summary);
        }

        stats.duration = start_time.elapsed();
        stats.merge_metrics = aggregator;

        info!(
            datasets = stats.datasets_written,
            duration_secs = stats.duration.as_secs_f64(),
            "Campaign run complete"
        );

        Ok(stats)
    }

    /// Schedule, filter, and materialize one dataset.
    fn build_one(
        &self,
        path: &Path,
        seed: u64,
        aggregator: &mut MergeMetricsAggregator,
    ) -> Result<DatasetSummary, ContractError> {
        let config = &self.config;

        let mut engine = MergeEngine::new(
            &config.manifests,
            config.blueprint.cuts,
            &config.blueprint.storage.events_section,
            seed,
        )?;
        engine.run_until(config.live_time)?;

        // Per-stream admission counts; build_dataset resets them afterwards
        for stream in engine.streams() {
            let admitted = stream.admitted() as u64;
            record_stream_admissions(stream.name().as_str(), admitted);
            aggregator.record_stream(stream.name().as_str(), admitted);
        }

        engine.build_dataset(path)
    }

    fn dataset_path(&self, index: u32) -> PathBuf {
        Path::new(&self.config.blueprint.storage.output_dir)
            .join(format!("mergedfile_{index}.{CONTAINER_EXTENSION}"))
    }
}
