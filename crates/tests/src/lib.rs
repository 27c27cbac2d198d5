//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - contract snapshot checks
//! - full merge runs on synthetic source trees (no simulation chain required)
//! - determinism and payload policy behavior

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::{Path, PathBuf};

    use bytes::Bytes;
    use tempfile::tempdir;

    use config_loader::{resolve_manifests, ConfigLoader};
    use contracts::{ContractError, MinLengthCheck, Position};
    use merge_engine::MergeEngine;
    use record_store::{event_timestamp, DatasetReader, SourceFileWriter};

    /// Write one source container with payloads tagged by component name.
    fn write_source(path: &Path, efficiency: f64, payloads: &[Vec<u8>]) {
        let mut writer = SourceFileWriter::create(path, "events").unwrap();
        for (i, payload) in payloads.iter().enumerate() {
            writer.append(
                Bytes::copy_from_slice(payload),
                Position::new(i as f64 * 10.0, 0.0, 0.0),
            );
        }
        writer.finish(efficiency, b"run-info-v1").unwrap();
    }

    /// Populate one component directory with `files` containers.
    fn write_component(base: &Path, name: &str, efficiency: f64, files: usize, events: usize) {
        let dir = base.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for file in 0..files {
            let payloads: Vec<Vec<u8>> = (0..events)
                .map(|evt| format!("{name}-f{file}-e{evt:02}").into_bytes())
                .collect();
            write_source(&dir.join(format!("run_{file:03}.evd")), efficiency, &payloads);
        }
    }

    fn write_config(
        dir: &Path,
        base_dir: &Path,
        output_dir: &Path,
        time_window: f64,
        pos_window: f64,
        components: &str,
    ) -> PathBuf {
        let config_path = dir.join("config.toml");
        let content = format!(
            r#"
[storage]
base_dir = "{}"
output_dir = "{}"

[cuts]
time_window = {}
pos_window = {}

{}
"#,
            base_dir.display(),
            output_dir.display(),
            time_window,
            pos_window,
            components
        );
        std::fs::write(&config_path, content).unwrap();
        config_path
    }

    const TWO_COMPONENTS: &str = r#"
[[components]]
name = "ibd"
directory = "ibd"
rate = 0.8
class = "multi"

[[components]]
name = "li9"
directory = "li9"
rate = 0.6
class = "single"
"#;

    /// End-to-end: config file -> manifests -> engine -> dataset read-back.
    ///
    /// Exercises the full chain on a synthetic source tree:
    /// 1. TOML config load with a storage subdirectory applied
    /// 2. component directory resolution
    /// 3. scheduling, coincidence filtering, and materialization
    /// 4. merged dataset verification through the reader
    #[test]
    fn test_e2e_merge_campaign() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().join("mc");
        let output = tmp.path().join("merged");

        write_component(&base.join("variant"), "ibd", 0.85, 2, 6);
        write_component(&base.join("variant"), "li9", 0.85, 2, 6);

        let config_path = write_config(tmp.path(), &base, &output, 5.0, 1.0e9, TWO_COMPONENTS);

        let mut blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        blueprint.apply_subdir("variant");

        let manifests = resolve_manifests(&blueprint).unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].files.len(), 2);

        std::fs::create_dir_all(&blueprint.storage.output_dir).unwrap();
        let dataset_path = Path::new(&blueprint.storage.output_dir).join("mergedfile_0.evd");

        let mut engine = MergeEngine::new(
            &manifests,
            blueprint.cuts,
            &blueprint.storage.events_section,
            1234,
        )
        .unwrap();
        engine.run_until(600.0).unwrap();

        assert!(engine.scheduled() > 0);
        let summary = engine.build_dataset(&dataset_path).unwrap();

        assert_eq!(summary.path, dataset_path);
        assert!(summary.livetime >= 600.0);
        assert!(summary.written > 0, "wide cuts should admit events");
        assert_eq!(summary.written + summary.skipped_payloads, summary.admitted);

        let mut reader = DatasetReader::open(&dataset_path, "events").unwrap();
        let header = reader.header();
        assert_eq!(header.event_count, summary.written);
        assert_eq!(header.livetime, summary.livetime);
        assert_eq!(reader.run_info().unwrap(), b"run-info-v1");

        let events = reader.events().unwrap();
        assert_eq!(events.len() as u64, summary.written);

        for pair in events.windows(2) {
            assert!(
                (pair[0].utc_secs, pair[0].utc_nanos) <= (pair[1].utc_secs, pair[1].utc_nanos),
                "events must be stored in admission order"
            );
        }

        for event in &events {
            let source = event.source.as_str();
            assert!(source == "ibd" || source == "li9", "unexpected source {source}");
            // Payloads are tagged with their component at fixture time
            assert!(
                event.payload.as_ref().starts_with(source.as_bytes()),
                "payload drawn from the wrong stream"
            );
            assert!(event_timestamp(event).is_some());
        }
    }

    /// Identical seeds must reproduce the schedule and the dataset.
    #[test]
    fn test_same_seed_reproduces_dataset() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().join("mc");
        let output = tmp.path().join("merged");

        write_component(&base, "ibd", 1.0, 1, 8);
        write_component(&base, "li9", 1.0, 1, 8);

        let config_path = write_config(tmp.path(), &base, &output, 5.0, 1.0e9, TWO_COMPONENTS);
        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        let manifests = resolve_manifests(&blueprint).unwrap();

        std::fs::create_dir_all(&output).unwrap();

        let mut first_events = Vec::new();
        let mut first_times = Vec::new();
        for (run, path) in [
            output.join("mergedfile_0.evd"),
            output.join("mergedfile_1.evd"),
        ]
        .iter()
        .enumerate()
        {
            let mut engine = MergeEngine::new(
                &manifests,
                blueprint.cuts,
                &blueprint.storage.events_section,
                42,
            )
            .unwrap();
            engine.run_until(300.0).unwrap();

            let times: Vec<f64> = engine.table().records().iter().map(|r| r.time).collect();
            engine.build_dataset(path).unwrap();

            let mut reader = DatasetReader::open(path, "events").unwrap();
            let events = reader.events().unwrap();

            if run == 0 {
                first_times = times;
                first_events = events;
            } else {
                assert_eq!(times, first_times, "admission times must match");
                assert_eq!(events.len(), first_events.len());
                for (a, b) in events.iter().zip(first_events.iter()) {
                    assert_eq!(a.utc_secs, b.utc_secs);
                    assert_eq!(a.utc_nanos, b.utc_nanos);
                    assert_eq!(a.source, b.source);
                    assert_eq!(a.payload, b.payload);
                }
            }
        }
    }

    /// Zero-width cuts: multi-class streams pass untouched, single-class
    /// streams can never satisfy the strict proximity test.
    #[test]
    fn test_zero_cuts_split_by_class() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().join("mc");

        write_component(&base, "ibd", 1.0, 1, 8);
        write_component(&base, "li9", 1.0, 1, 8);

        let config_path = write_config(
            tmp.path(),
            &base,
            &tmp.path().join("merged"),
            0.0,
            0.0,
            TWO_COMPONENTS,
        );
        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        let manifests = resolve_manifests(&blueprint).unwrap();

        let mut engine = MergeEngine::new(
            &manifests,
            blueprint.cuts,
            &blueprint.storage.events_section,
            7,
        )
        .unwrap();
        engine.run_until(400.0).unwrap();

        let streams = engine.streams();
        let multi = streams.iter().find(|s| s.name().as_str() == "ibd").unwrap();
        let single = streams.iter().find(|s| s.name().as_str() == "li9").unwrap();

        assert!(multi.admitted() > 0);
        assert_eq!(single.admitted(), 0, "zero windows admit no single-class events");
        assert_eq!(engine.admitted(), multi.admitted() as u64);

        // Every judged candidate is either admitted or discarded; at most the
        // final pending one is never judged.
        let judged = engine.admitted() + engine.discarded();
        assert!(engine.scheduled() - judged <= 1);
    }

    /// A payload policy failure skips the record but keeps the dataset.
    #[test]
    fn test_payload_check_skips_short_records() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().join("mc");
        let dir = base.join("ibd");
        std::fs::create_dir_all(&dir).unwrap();

        // Alternating short and long records
        let payloads: Vec<Vec<u8>> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    b"aa".to_vec()
                } else {
                    b"dddddd".to_vec()
                }
            })
            .collect();
        write_source(&dir.join("run_000.evd"), 1.0, &payloads);

        let components = r#"
[[components]]
name = "ibd"
directory = "ibd"
rate = 1.0
class = "multi"
"#;
        let config_path = write_config(
            tmp.path(),
            &base,
            &tmp.path().join("merged"),
            0.0005,
            1500.0,
            components,
        );
        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        let manifests = resolve_manifests(&blueprint).unwrap();

        std::fs::create_dir_all(&blueprint.storage.output_dir).unwrap();
        let dataset_path = Path::new(&blueprint.storage.output_dir).join("mergedfile_0.evd");

        let mut engine = MergeEngine::new(
            &manifests,
            blueprint.cuts,
            &blueprint.storage.events_section,
            5,
        )
        .unwrap()
        .with_check(Box::new(MinLengthCheck { min_bytes: 4 }));

        engine.run_until(120.0).unwrap();
        let summary = engine.build_dataset(&dataset_path).unwrap();

        assert!(summary.skipped_payloads > 0, "short records should be skipped");
        assert!(summary.written > 0, "long records should survive");
        assert_eq!(summary.written + summary.skipped_payloads, summary.admitted);

        let mut reader = DatasetReader::open(&dataset_path, "events").unwrap();
        for event in reader.events().unwrap() {
            assert!(event.payload.len() >= 4);
        }
    }

    /// Resolution fails fast when a component directory holds no files.
    #[test]
    fn test_empty_component_directory_fails_resolution() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().join("mc");

        write_component(&base, "ibd", 1.0, 1, 4);
        std::fs::create_dir_all(base.join("li9")).unwrap();

        let config_path = write_config(
            tmp.path(),
            &base,
            &tmp.path().join("merged"),
            0.0005,
            1500.0,
            TWO_COMPONENTS,
        );
        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();

        let result = resolve_manifests(&blueprint);
        assert!(matches!(
            result,
            Err(ContractError::EmptySourceDir { ref component, .. }) if component == "li9"
        ));
    }
}
