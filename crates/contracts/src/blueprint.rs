//! MergeBlueprint - Config Loader output
//!
//! Describes one merge campaign: storage roots, coincidence cuts, and the
//! component streams to interleave.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{ComponentDescriptor, StreamName};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete merge campaign blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Storage roots and container naming
    pub storage: StorageConfig,

    /// Coincidence cut windows
    pub cuts: CutConfig,

    /// Component stream definitions
    pub components: Vec<ComponentDescriptor>,
}

/// Storage roots: where source files live and where merged datasets go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per component
    pub base_dir: String,

    /// Directory merged datasets are written into
    pub output_dir: String,

    /// Name of the events table inside each container
    #[serde(default = "default_events_section")]
    pub events_section: String,
}

fn default_events_section() -> String {
    "events".to_string()
}

/// Coincidence cut windows for the admission filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CutConfig {
    /// Temporal proximity threshold (seconds)
    pub time_window: f64,

    /// Spatial proximity threshold (position-database length units)
    pub pos_window: f64,
}

/// A component descriptor plus its resolved source file list.
///
/// Resolved once at configuration time so stream construction is a pure
/// data dependency instead of a directory scan. Files are sorted by name:
/// identical trees get identical file indices on every run.
#[derive(Debug, Clone)]
pub struct ComponentManifest {
    pub descriptor: ComponentDescriptor,
    pub files: Vec<PathBuf>,
}

impl MergeBlueprint {
    /// Append a subdirectory to both storage roots.
    ///
    /// Used to select a geometry/target variant without editing the config
    /// file, e.g. `wm_20pct_geo/wbls_1pct`.
    pub fn apply_subdir(&mut self, subdir: &str) {
        let trimmed = subdir.trim_matches('/');
        if trimmed.is_empty() {
            return;
        }
        self.storage.base_dir = join_path(&self.storage.base_dir, trimmed);
        self.storage.output_dir = join_path(&self.storage.output_dir, trimmed);
    }

    /// Absolute directory for one component's source files.
    pub fn component_dir(&self, descriptor: &ComponentDescriptor) -> PathBuf {
        Path::new(&self.storage.base_dir).join(&descriptor.directory)
    }

    /// Look up a component by stream name.
    pub fn component(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.name == name)
    }

    /// All configured stream names, in declaration order.
    pub fn stream_names(&self) -> impl Iterator<Item = &StreamName> {
        self.components.iter().map(|c| &c.name)
    }
}

fn join_path(base: &str, tail: &str) -> String {
    Path::new(base).join(tail).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamClass;

    fn sample_component(name: &str, class: StreamClass) -> ComponentDescriptor {
        ComponentDescriptor {
            name: name.into(),
            directory: name.to_string(),
            rate: 0.01,
            class,
        }
    }

    fn sample_blueprint() -> MergeBlueprint {
        MergeBlueprint {
            version: ConfigVersion::V1,
            storage: StorageConfig {
                base_dir: "/data/mc".into(),
                output_dir: "/data/merged".into(),
                events_section: "events".into(),
            },
            cuts: CutConfig {
                time_window: 0.0005,
                pos_window: 1500.0,
            },
            components: vec![
                sample_component("ibd", StreamClass::Multi),
                sample_component("li9", StreamClass::Single),
            ],
        }
    }

    #[test]
    fn apply_subdir_extends_both_roots() {
        let mut blueprint = sample_blueprint();
        blueprint.apply_subdir("wm_20pct_geo/wbls_1pct");
        assert_eq!(blueprint.storage.base_dir, "/data/mc/wm_20pct_geo/wbls_1pct");
        assert_eq!(
            blueprint.storage.output_dir,
            "/data/merged/wm_20pct_geo/wbls_1pct"
        );
    }

    #[test]
    fn apply_subdir_ignores_empty() {
        let mut blueprint = sample_blueprint();
        blueprint.apply_subdir("");
        blueprint.apply_subdir("/");
        assert_eq!(blueprint.storage.base_dir, "/data/mc");
    }

    #[test]
    fn component_dir_joins_base() {
        let blueprint = sample_blueprint();
        let li9 = blueprint.component("li9").unwrap();
        assert_eq!(
            blueprint.component_dir(li9),
            PathBuf::from("/data/mc/li9")
        );
    }

    #[test]
    fn events_section_defaults_when_omitted() {
        let json = r#"{
            "storage": { "base_dir": "/mc", "output_dir": "/out" },
            "cuts": { "time_window": 0.001, "pos_window": 2000.0 },
            "components": []
        }"#;
        let blueprint: MergeBlueprint = serde_json::from_str(json).unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.storage.events_section, "events");
    }
}
