//! # Record Store
//!
//! Container file format and deferred event retrieval.
//!
//! Responsibilities:
//! - define the on-disk container layout (magic / version / TOC / sections)
//! - light reads of headers and position databases without touching payloads
//! - indexed events table with sorted-subset fetches (`RecordStore`)
//! - merged dataset writing and read-back (`DatasetWriter` / `DatasetReader`)

pub mod container;
pub mod dataset;
pub mod format;
pub mod source;
pub mod store;

pub use container::{Container, ContainerWriter};
pub use dataset::{event_timestamp, DatasetReader, DatasetWriter};
pub use format::{
    DatasetHeader, PositionDb, SectionEntry, SourceHeader, CONTAINER_EXTENSION, FORMAT_VERSION,
    SECTION_HEADER, SECTION_MERGE_INFO, SECTION_POSDB, SECTION_RUN_INFO, STORE_MAGIC,
};
pub use source::SourceFileWriter;
pub use store::RecordStore;
