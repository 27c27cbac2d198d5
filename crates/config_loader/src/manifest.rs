//! Source manifest resolution
//!
//! Lists each component directory exactly once, at configuration time, and
//! hands the engine a fixed file list. Entries are sorted by file name so
//! file indices are stable across runs and hosts.

use std::path::Path;

use contracts::{ComponentManifest, ContractError, MergeBlueprint};

/// Resolve every component directory into a source manifest.
///
/// # Errors
/// - unreadable component directory
/// - component directory with no regular files
pub fn resolve_manifests(
    blueprint: &MergeBlueprint,
) -> Result<Vec<ComponentManifest>, ContractError> {
    blueprint
        .components
        .iter()
        .map(|descriptor| {
            let dir = blueprint.component_dir(descriptor);
            let files = list_source_files(&dir, descriptor.name.as_str())?;
            if files.is_empty() {
                return Err(ContractError::EmptySourceDir {
                    component: descriptor.name.to_string(),
                    path: dir.display().to_string(),
                });
            }
            Ok(ComponentManifest {
                descriptor: descriptor.clone(),
                files,
            })
        })
        .collect()
}

fn list_source_files(
    dir: &Path,
    component: &str,
) -> Result<Vec<std::path::PathBuf>, ContractError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        ContractError::config_validation(
            format!("components[{component}].directory"),
            format!("cannot read '{}': {e}", dir.display()),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            ContractError::config_validation(
                format!("components[{component}].directory"),
                format!("cannot read entry in '{}': {e}", dir.display()),
            )
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ComponentDescriptor, ConfigVersion, CutConfig, StorageConfig, StreamClass,
    };
    use std::fs;
    use tempfile::tempdir;

    fn blueprint_with_base(base: &Path, dirs: &[&str]) -> MergeBlueprint {
        MergeBlueprint {
            version: ConfigVersion::V1,
            storage: StorageConfig {
                base_dir: base.display().to_string(),
                output_dir: base.join("out").display().to_string(),
                events_section: "events".into(),
            },
            cuts: CutConfig {
                time_window: 0.0005,
                pos_window: 1500.0,
            },
            components: dirs
                .iter()
                .map(|d| ComponentDescriptor {
                    name: (*d).into(),
                    directory: d.to_string(),
                    rate: 0.01,
                    class: StreamClass::Single,
                })
                .collect(),
        }
    }

    #[test]
    fn resolves_sorted_file_list() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("li9");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("run_002.evd"), b"x").unwrap();
        fs::write(dir.join("run_000.evd"), b"x").unwrap();
        fs::write(dir.join("run_001.evd"), b"x").unwrap();
        fs::create_dir(dir.join("subdir")).unwrap();

        let bp = blueprint_with_base(tmp.path(), &["li9"]);
        let manifests = resolve_manifests(&bp).unwrap();
        assert_eq!(manifests.len(), 1);
        let names: Vec<_> = manifests[0]
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        // Subdirectories are skipped; files come back sorted
        assert_eq!(names, vec!["run_000.evd", "run_001.evd", "run_002.evd"]);
    }

    #[test]
    fn empty_directory_is_fatal() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("ibd")).unwrap();

        let bp = blueprint_with_base(tmp.path(), &["ibd"]);
        let result = resolve_manifests(&bp);
        assert!(matches!(
            result,
            Err(ContractError::EmptySourceDir { .. })
        ));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = tempdir().unwrap();
        let bp = blueprint_with_base(tmp.path(), &["nonexistent"]);
        let result = resolve_manifests(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("cannot read"), "got: {err}");
    }
}
