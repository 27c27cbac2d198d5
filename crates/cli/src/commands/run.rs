//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::campaign::{Campaign, CampaignConfig};
use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub fn run_merge(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref subdir) = args.subdir {
        info!(subdir = %subdir, "Appending subdirectory to storage roots");
        blueprint.apply_subdir(subdir);
    }

    info!(
        base_dir = %blueprint.storage.base_dir,
        output_dir = %blueprint.storage.output_dir,
        components = blueprint.components.len(),
        "Configuration loaded"
    );

    // Resolve component directories up front; a missing or empty source
    // directory must fail before any dataset is written.
    let manifests = config_loader::resolve_manifests(&blueprint)
        .context("Failed to resolve component source files")?;

    // Dry run - validate, resolve sources, and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_campaign_summary(&blueprint, &manifests, args);
        return Ok(());
    }

    // Initialize Metrics (optional)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    // Log the seed even when derived so any campaign can be replayed.
    let seed = args.seed.unwrap_or_else(derive_seed);
    info!(seed, "Campaign seed");

    let campaign_config = CampaignConfig {
        blueprint,
        manifests,
        num_datasets: args.num_datasets,
        start_index: args.start_index,
        live_time: args.live_time,
        seed,
    };

    let campaign = Campaign::new(campaign_config);

    info!("Starting merge campaign...");

    let stats = campaign.run().context("Merge campaign failed")?;

    info!(
        datasets = stats.datasets_written,
        events = stats.events_written,
        duration_secs = stats.duration.as_secs_f64(),
        eps = format!("{:.2}", stats.events_per_second()),
        "Campaign completed successfully"
    );

    stats.print_summary();

    info!("Pileup merger finished");
    Ok(())
}

/// Derive a seed from the wall clock and process id for unseeded runs
fn derive_seed() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ u64::from(std::process::id())
}

/// Print campaign summary for dry-run mode
fn print_campaign_summary(
    blueprint: &contracts::MergeBlueprint,
    manifests: &[contracts::ComponentManifest],
    args: &RunArgs,
) {
    println!("\n=== Campaign Summary ===\n");
    println!("Storage:");
    println!("  Source root: {}", blueprint.storage.base_dir);
    println!("  Output: {}", blueprint.storage.output_dir);
    println!("  Events section: {}", blueprint.storage.events_section);

    println!("\nCoincidence cuts:");
    println!("  Time window: {} s", blueprint.cuts.time_window);
    println!("  Position window: {}", blueprint.cuts.pos_window);

    println!("\nComponents ({}):", manifests.len());
    for manifest in manifests {
        let descriptor = &manifest.descriptor;
        println!(
            "  - {} ({:?}, {} Hz) - {} files",
            descriptor.name,
            descriptor.class,
            descriptor.rate,
            manifest.files.len()
        );
    }

    println!("\nCampaign:");
    println!(
        "  Datasets: {} starting at index {}",
        args.num_datasets, args.start_index
    );
    println!("  Live time: {} s each", args.live_time);

    println!();
}
