//! # Source Stream
//!
//! Per-component event stream over a set of container files.
//!
//! Responsibilities:
//! - eager header / position-db loading, aggregate efficiency
//! - uniform event sampling with an injected RNG
//! - admission accumulation and two-phase payload materialization

pub mod profile;
pub mod stream;

pub use profile::StreamProfile;
pub use stream::{EventDraw, SourceStream};
