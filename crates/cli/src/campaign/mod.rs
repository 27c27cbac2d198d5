//! Merge campaign orchestration module.

mod runner;
mod stats;

pub use runner::{Campaign, CampaignConfig};
pub use stats::CampaignStats;
