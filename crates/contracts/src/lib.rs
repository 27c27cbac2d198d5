//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - The merge clock is elapsed live time in seconds (f64), anchored at the
//!   Unix epoch when events are stamped into a dataset
//! - Admission order is clock order with a stable insertion-sequence tie-break

mod blueprint;
mod check;
mod component;
mod error;
mod event;
mod stream_name;
mod summary;

pub use blueprint::*;
pub use check::{MinLengthCheck, PayloadCheck, PermissiveCheck};
pub use component::*;
pub use error::*;
pub use event::*;
pub use stream_name::StreamName;
pub use summary::DatasetSummary;
