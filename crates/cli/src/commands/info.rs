//! `info` command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use contracts::MergedEvent;
use record_store::{event_timestamp, DatasetHeader, DatasetReader};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    storage: StorageInfo,
    cuts: CutsInfo,
    components: Vec<ComponentInfo>,
}

#[derive(Serialize)]
struct StorageInfo {
    base_dir: String,
    output_dir: String,
    events_section: String,
}

#[derive(Serialize)]
struct CutsInfo {
    time_window: f64,
    pos_window: f64,
}

#[derive(Serialize)]
struct ComponentInfo {
    name: String,
    directory: String,
    class: String,
    rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_files: Option<usize>,
}

/// Dataset info for JSON output
#[derive(Serialize)]
struct DatasetInfo {
    path: String,
    livetime: f64,
    event_count: u64,
    run_info_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_utc: Option<String>,
    sources: Vec<SourceCount>,
    events: Vec<EventInfo>,
}

#[derive(Serialize)]
struct SourceCount {
    source: String,
    events: u64,
}

#[derive(Serialize)]
struct EventInfo {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    utc: Option<String>,
    source: String,
    payload_bytes: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    if let Some(ref dataset) = args.dataset {
        return inspect_dataset(dataset, args);
    }

    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::MergeBlueprint, args: &InfoArgs) -> ConfigInfo {
    let components = blueprint
        .components
        .iter()
        .map(|c| ComponentInfo {
            name: c.name.to_string(),
            directory: c.directory.clone(),
            class: format!("{:?}", c.class),
            rate: c.rate,
            source_files: if args.components {
                count_source_files(&blueprint.component_dir(c))
            } else {
                None
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        storage: StorageInfo {
            base_dir: blueprint.storage.base_dir.clone(),
            output_dir: blueprint.storage.output_dir.clone(),
            events_section: blueprint.storage.events_section.clone(),
        },
        cuts: CutsInfo {
            time_window: blueprint.cuts.time_window,
            pos_window: blueprint.cuts.pos_window,
        },
        components,
    }
}

/// Count regular files in a component directory, None when unreadable.
fn count_source_files(dir: &Path) -> Option<usize> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .count(),
    )
}

fn print_config_info(blueprint: &contracts::MergeBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Pileup Merger Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Storage
    println!("📍 Storage");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Source root: {}", blueprint.storage.base_dir);
    println!("   ├─ Output: {}", blueprint.storage.output_dir);
    println!("   └─ Events section: {}", blueprint.storage.events_section);

    // Coincidence cuts
    println!("\n⚙️  Coincidence Cuts");
    println!("   ├─ Time window: {} s", blueprint.cuts.time_window);
    println!("   └─ Position window: {}", blueprint.cuts.pos_window);

    // Components
    println!("\n📥 Components ({})", blueprint.components.len());
    for (i, component) in blueprint.components.iter().enumerate() {
        let is_last = i == blueprint.components.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({:?}, {} Hz)",
            prefix, component.name, component.class, component.rate
        );

        if args.components {
            let dir = blueprint.component_dir(component);
            match count_source_files(&dir) {
                Some(count) => {
                    println!("   {}  └─ {} source files", child_prefix, count);
                }
                None => {
                    println!(
                        "   {}  └─ directory unreadable: {}",
                        child_prefix,
                        dir.display()
                    );
                }
            }
        }
    }

    println!();
}

fn inspect_dataset(path: &Path, args: &InfoArgs) -> Result<()> {
    info!(dataset = %path.display(), "Inspecting merged dataset");

    if !path.exists() {
        anyhow::bail!("Dataset file not found: {}", path.display());
    }

    let section = events_section_from_config(args);
    let mut reader = DatasetReader::open(path, &section)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;

    let header = reader.header();
    let run_info = reader.run_info().context("Failed to read run metadata")?;
    let events = reader
        .events()
        .with_context(|| format!("Failed to decode events from {}", path.display()))?;

    if args.json {
        let info = build_dataset_info(path, header, &run_info, &events, args.limit);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize dataset info")?;
        println!("{}", json);
    } else {
        print_dataset_info(path, header, &run_info, &events, args.limit);
    }

    Ok(())
}

/// Events table name, taken from the config when one is readable.
fn events_section_from_config(args: &InfoArgs) -> String {
    if args.config.exists() {
        if let Ok(blueprint) = config_loader::ConfigLoader::load_from_path(&args.config) {
            return blueprint.storage.events_section;
        }
    }
    debug!("No readable config, assuming default events section");
    "events".to_string()
}

fn build_dataset_info(
    path: &Path,
    header: DatasetHeader,
    run_info: &[u8],
    events: &[MergedEvent],
    limit: usize,
) -> DatasetInfo {
    let listed = events
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, event)| EventInfo {
            index,
            utc: event_timestamp(event).map(|ts| ts.to_rfc3339()),
            source: event.source.to_string(),
            payload_bytes: event.payload.len(),
        })
        .collect();

    DatasetInfo {
        path: path.display().to_string(),
        livetime: header.livetime,
        event_count: header.event_count,
        run_info_bytes: run_info.len(),
        first_utc: events
            .first()
            .and_then(event_timestamp)
            .map(|ts| ts.to_rfc3339()),
        last_utc: events
            .last()
            .and_then(event_timestamp)
            .map(|ts| ts.to_rfc3339()),
        sources: source_counts(events),
        events: listed,
    }
}

/// Event counts grouped by source stream, sorted by name.
fn source_counts(events: &[MergedEvent]) -> Vec<SourceCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for event in events {
        *counts.entry(event.source.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(source, events)| SourceCount {
            source: source.to_string(),
            events,
        })
        .collect()
}

/// RFC 3339 when the timestamp is representable, raw parts otherwise.
fn format_timestamp(event: &MergedEvent) -> String {
    match event_timestamp(event) {
        Some(ts) => ts.to_rfc3339(),
        None => format!("{}s+{}ns", event.utc_secs, event.utc_nanos),
    }
}

fn print_dataset_info(
    path: &Path,
    header: DatasetHeader,
    run_info: &[u8],
    events: &[MergedEvent],
    limit: usize,
) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Merged Dataset Inspection                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Header");
    println!("   ├─ Path: {}", path.display());
    println!("   ├─ Live time: {:.3} s", header.livetime);
    println!("   ├─ Events: {}", header.event_count);
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        println!(
            "   ├─ Span: {} .. {}",
            format_timestamp(first),
            format_timestamp(last)
        );
    }
    println!("   └─ Run metadata: {} bytes", run_info.len());

    if events.is_empty() {
        println!("\n   (no events)");
        println!();
        return;
    }

    let counts = source_counts(events);
    println!("\n📡 Sources ({})", counts.len());
    for (i, entry) in counts.iter().enumerate() {
        let prefix = if i == counts.len() - 1 { "└─" } else { "├─" };
        println!("   {} {}: {} events", prefix, entry.source, entry.events);
    }

    let shown = events.len().min(limit);
    println!("\n📥 Events (showing {} of {})", shown, events.len());
    for (i, event) in events.iter().take(limit).enumerate() {
        let is_last = i == shown - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!(
            "   {} [{}] {} {} ({} bytes)",
            prefix,
            i,
            format_timestamp(event),
            event.source,
            event.payload.len()
        );
    }

    println!();
}
