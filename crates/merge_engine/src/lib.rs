//! # Merge Engine
//!
//! Pile-up merging of independently simulated event streams.
//!
//! Owns the whole campaign:
//! - exponential interarrival sampling per stream, thinned by efficiency
//! - a rolling three-deep admission window applying the coincidence cut
//! - deferred payload materialization once the timeline is final
//! - merged dataset assembly with epoch-anchored timestamps
//!
//! ## Usage
//!
//! ```ignore
//! use merge_engine::MergeEngine;
//!
//! let mut engine = MergeEngine::new(&manifests, cuts, "events", seed)?;
//! engine.run_until(3600.0)?;
//! let summary = engine.build_dataset(&output_path)?;
//! ```

mod engine;
mod table;
mod window;

pub use engine::MergeEngine;
pub use table::{AdmissionRecord, AdmissionTable};
pub use window::{euclidean_distance, AdmissionWindow, AdmittedEvent, Candidate};

// Re-export contracts types callers need alongside the engine
pub use contracts::{ComponentManifest, CutConfig, DatasetSummary, PayloadCheck, PermissiveCheck};
