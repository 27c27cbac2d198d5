//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    base_dir: String,
    output_dir: String,
    component_count: usize,
    single_count: usize,
    time_window: f64,
    pos_window: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let single_count = blueprint
                .components
                .iter()
                .filter(|c| c.class.is_single())
                .count();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    base_dir: blueprint.storage.base_dir.clone(),
                    output_dir: blueprint.storage.output_dir.clone(),
                    component_count: blueprint.components.len(),
                    single_count,
                    time_window: blueprint.cuts.time_window,
                    pos_window: blueprint.cuts.pos_window,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::MergeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // A zero-width window can never satisfy the strict proximity test
    if blueprint.cuts.time_window <= 0.0 || blueprint.cuts.pos_window <= 0.0 {
        warnings.push(
            "Coincidence windows include zero - single-class events will never be admitted"
                .to_string(),
        );
    }

    // Components sharing a directory draw from the same source files
    for (i, a) in blueprint.components.iter().enumerate() {
        for b in blueprint.components.iter().skip(i + 1) {
            if a.directory == b.directory {
                warnings.push(format!(
                    "Components '{}' and '{}' share directory '{}'",
                    a.name, b.name, a.directory
                ));
            }
        }
    }

    if !std::path::Path::new(&blueprint.storage.base_dir).exists() {
        warnings.push(format!(
            "Source root '{}' does not exist on this host",
            blueprint.storage.base_dir
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source root: {}", summary.base_dir);
            println!("  Output: {}", summary.output_dir);
            println!(
                "  Components: {} ({} single-class)",
                summary.component_count, summary.single_count
            );
            println!("  Time window: {} s", summary.time_window);
            println!("  Position window: {}", summary.pos_window);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
