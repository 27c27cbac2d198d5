//! Error types for CLI operations.

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A dataset build failed partway through the campaign
    #[error("Merge failed for dataset {index}")]
    MergeFailed {
        index: u32,
        #[source]
        source: ContractError,
    },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn merge_failed(index: u32, source: ContractError) -> Self {
        Self::MergeFailed { index, source }
    }
}
