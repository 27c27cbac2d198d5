//! PayloadCheck trait - per-record integrity policy
//!
//! Applied to every payload fetched from a record store. A failing record is
//! replaced by an empty placeholder rather than aborting the run.

/// Per-record integrity policy.
///
/// Implementations must be pure with respect to the payload bytes; the
/// store calls `ok` once per fetched record.
pub trait PayloadCheck {
    /// Policy name (used for logging/metrics)
    fn name(&self) -> &str;

    /// True if the record should be kept as-is
    fn ok(&self, payload: &[u8]) -> bool;
}

/// Accepts every record.
///
/// The production default: selection cuts live downstream, so the merge
/// keeps whatever the simulation wrote.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveCheck;

impl PayloadCheck for PermissiveCheck {
    fn name(&self) -> &str {
        "permissive"
    }

    fn ok(&self, _payload: &[u8]) -> bool {
        true
    }
}

/// Rejects records shorter than a byte threshold.
///
/// Catches truncated or empty simulation records without interpreting them.
#[derive(Debug, Clone, Copy)]
pub struct MinLengthCheck {
    pub min_bytes: usize,
}

impl PayloadCheck for MinLengthCheck {
    fn name(&self) -> &str {
        "min_length"
    }

    fn ok(&self, payload: &[u8]) -> bool {
        payload.len() >= self.min_bytes
    }
}
