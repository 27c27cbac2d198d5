//! Merge Pipeline Example
//!
//! Generates a synthetic two-component source tree, merges it into one
//! dataset, and reads the result back.
//!
//! Run with: cargo run --bin merge_pipeline [config_path]

use std::path::PathBuf;

use bytes::Bytes;
use config_loader::{resolve_manifests, ConfigLoader};
use contracts::Position;
use merge_engine::MergeEngine;
use record_store::{event_timestamp, DatasetReader, SourceFileWriter};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Merge Pipeline Demo");

    // ==== Stage 1: Locate or generate a source tree ====
    let config_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => generate_demo_tree()?,
    };

    info!(path = %config_path.display(), "Loading config file");
    let blueprint = ConfigLoader::load_from_path(config_path.as_path())?;
    info!(
        components = blueprint.components.len(),
        base_dir = %blueprint.storage.base_dir,
        "Blueprint loaded"
    );

    // ==== Stage 2: Resolve source manifests ====
    let manifests = resolve_manifests(&blueprint)?;
    for manifest in &manifests {
        info!(
            component = %manifest.descriptor.name,
            class = ?manifest.descriptor.class,
            files = manifest.files.len(),
            "Component resolved"
        );
    }

    // ==== Stage 3: Schedule and filter ====
    let live_time = 1800.0;
    let mut engine = MergeEngine::new(
        &manifests,
        blueprint.cuts,
        &blueprint.storage.events_section,
        2024,
    )?;
    engine.run_until(live_time)?;

    info!(
        scheduled = engine.scheduled(),
        admitted = engine.admitted(),
        discarded = engine.discarded(),
        "Schedule complete"
    );

    // ==== Stage 4: Materialize the dataset ====
    std::fs::create_dir_all(&blueprint.storage.output_dir)?;
    let dataset_path = PathBuf::from(&blueprint.storage.output_dir).join("mergedfile_0.evd");
    let summary = engine.build_dataset(&dataset_path)?;

    info!(
        path = %dataset_path.display(),
        events = summary.written,
        skipped = summary.skipped_payloads,
        livetime = format!("{:.1}", summary.livetime),
        "Dataset written"
    );

    // ==== Stage 5: Read the dataset back ====
    let mut reader = DatasetReader::open(&dataset_path, &blueprint.storage.events_section)?;
    let events = reader.events()?;

    for (i, event) in events.iter().take(5).enumerate() {
        let when = event_timestamp(event)
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default();
        info!(
            index = i,
            utc = %when,
            source = %event.source,
            bytes = event.payload.len(),
            "Merged event"
        );
    }

    info!(total = events.len(), "Merge Pipeline Demo finished");
    Ok(())
}

/// Write a small two-component source tree plus its config under the system
/// temp directory, returning the config path.
fn generate_demo_tree() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let root = std::env::temp_dir().join("pileup_merger_demo");
    // Start from a clean tree so repeat runs stay reproducible
    let _ = std::fs::remove_dir_all(&root);

    let base = root.join("mc");
    for (name, events) in [("ibd", 64usize), ("li9", 64)] {
        let dir = base.join(name);
        std::fs::create_dir_all(&dir)?;
        for file in 0..2 {
            let path = dir.join(format!("run_{file:03}.evd"));
            let mut writer = SourceFileWriter::create(&path, "events")?;
            for evt in 0..events {
                let payload = format!("{name}-f{file}-e{evt:03}");
                writer.append(
                    Bytes::from(payload.into_bytes()),
                    Position::new(evt as f64 * 25.0, 0.0, file as f64 * 100.0),
                );
            }
            writer.finish(0.9, b"demo geometry v1")?;
        }
    }

    let config_path = root.join("config.toml");
    let config = format!(
        r#"[storage]
base_dir = "{}"
output_dir = "{}"

[cuts]
time_window = 2.0
pos_window = 5000.0

[[components]]
name = "ibd"
directory = "ibd"
rate = 0.05
class = "multi"

[[components]]
name = "li9"
directory = "li9"
rate = 0.4
class = "single"
"#,
        base.display(),
        root.join("merged").display()
    );
    std::fs::write(&config_path, config)?;

    info!(root = %root.display(), "Generated demo source tree");
    Ok(config_path)
}
