//! Layered error definitions
//!
//! Categorized by source: config / storage / stream / merge

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Component directory resolved to zero source files
    #[error("component '{component}' has no source files under '{path}'")]
    EmptySourceDir { component: String, path: String },

    /// Effective arrival rate is unusable for exponential sampling
    #[error("stream '{stream}' has degenerate effective rate: rate={rate}, efficiency={efficiency}")]
    DegenerateRate {
        stream: String,
        rate: f64,
        efficiency: f64,
    },

    // ===== Storage Errors =====
    /// Container prefix did not match the expected magic/version
    #[error("unsupported container format in '{path}': {message}")]
    UnsupportedFormat { path: String, message: String },

    /// Required section absent from a container
    #[error("section '{section}' missing from '{path}'")]
    SectionMissing { path: String, section: String },

    /// Container contents failed to decode
    #[error("corrupt container '{path}': {message}")]
    StoreCorrupt { path: String, message: String },

    /// Requested event index beyond the stored table
    #[error("event index {index} out of range for '{path}' ({entries} entries)")]
    EventIndexOutOfRange {
        path: String,
        index: usize,
        entries: u64,
    },

    // ===== Stream Errors =====
    /// Position database holds no events to sample from
    #[error("position database in '{path}' is empty")]
    PositionDbEmpty { path: String },

    // ===== Merge Errors =====
    /// Materialized payload pool ran dry while building a dataset
    #[error("stream '{stream}' exhausted its materialized payloads at admission {admission}")]
    CursorExhausted { stream: String, admission: usize },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unsupported-format error
    pub fn unsupported_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create corrupt-container error
    pub fn store_corrupt(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}
