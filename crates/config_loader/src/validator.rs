//! Configuration validation
//!
//! Rules:
//! - at least one component
//! - component names unique and non-empty
//! - component directories non-empty
//! - rate finite and > 0
//! - cut windows finite and >= 0
//! - storage roots and events section non-empty

use std::collections::HashSet;

use contracts::{ContractError, MergeBlueprint};

/// Validate a MergeBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    validate_storage(blueprint)?;
    validate_cuts(blueprint)?;
    validate_components(blueprint)?;
    Ok(())
}

/// Validate storage roots
fn validate_storage(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    let storage = &blueprint.storage;
    if storage.base_dir.is_empty() {
        return Err(ContractError::config_validation(
            "storage.base_dir",
            "base_dir cannot be empty",
        ));
    }
    if storage.output_dir.is_empty() {
        return Err(ContractError::config_validation(
            "storage.output_dir",
            "output_dir cannot be empty",
        ));
    }
    if storage.events_section.is_empty() {
        return Err(ContractError::config_validation(
            "storage.events_section",
            "events_section cannot be empty",
        ));
    }
    Ok(())
}

/// Validate coincidence cut windows
fn validate_cuts(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    let cuts = &blueprint.cuts;
    if !cuts.time_window.is_finite() || cuts.time_window < 0.0 {
        return Err(ContractError::config_validation(
            "cuts.time_window",
            format!("time_window must be finite and >= 0, got {}", cuts.time_window),
        ));
    }
    if !cuts.pos_window.is_finite() || cuts.pos_window < 0.0 {
        return Err(ContractError::config_validation(
            "cuts.pos_window",
            format!("pos_window must be finite and >= 0, got {}", cuts.pos_window),
        ));
    }
    Ok(())
}

/// Validate component list
fn validate_components(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    if blueprint.components.is_empty() {
        return Err(ContractError::config_validation(
            "components",
            "at least one component is required",
        ));
    }

    let mut seen = HashSet::new();
    for component in &blueprint.components {
        if component.name.is_empty() {
            return Err(ContractError::config_validation(
                "components[].name",
                "component name cannot be empty",
            ));
        }
        if !seen.insert(component.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("components[name={}]", component.name),
                "duplicate component name",
            ));
        }
        if component.directory.is_empty() {
            return Err(ContractError::config_validation(
                format!("components[{}].directory", component.name),
                "directory cannot be empty",
            ));
        }
        if !component.rate.is_finite() || component.rate <= 0.0 {
            return Err(ContractError::config_validation(
                format!("components[{}].rate", component.name),
                format!("rate must be finite and > 0, got {}", component.rate),
            ));
        }
    }
    Ok(())
}
