//! ComponentDescriptor - one configured event stream
//!
//! Immutable after configuration load.

use serde::{Deserialize, Serialize};

use crate::StreamName;

/// One simulated event component (signal or background source).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Stream name, used in admissions and merged events
    pub name: StreamName,

    /// Source directory, relative to `storage.base_dir`
    pub directory: String,

    /// Nominal arrival rate (events per second), before efficiency thinning
    pub rate: f64,

    /// Coincidence classification
    pub class: StreamClass,
}

/// How the admission filter treats a stream's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamClass {
    /// Singly-occurring events, subject to the coincidence cut
    #[default]
    Single,

    /// Intrinsically multi-part events, always admitted
    Multi,
}

impl StreamClass {
    /// True for streams the coincidence cut applies to.
    #[inline]
    pub fn is_single(&self) -> bool {
        matches!(self, StreamClass::Single)
    }
}
