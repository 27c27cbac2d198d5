//! Container reading and writing
//!
//! `Container` gives random access to named sections; `ContainerWriter`
//! appends sections and backpatches the TOC offset on finish. Small sections
//! (headers, position db, run metadata) are bincode records; the events table
//! gets its own index so readers can fetch single records.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use contracts::ContractError;

use crate::format::{SectionEntry, FORMAT_VERSION, PREFIX_LEN, STORE_MAGIC};

/// Read side of a container file.
#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    file: File,
    sections: Vec<SectionEntry>,
}

impl Container {
    /// Open a container and read its TOC.
    ///
    /// # Errors
    /// - file unreadable
    /// - magic or version mismatch
    /// - TOC fails to decode
    pub fn open(path: &Path) -> Result<Self, ContractError> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 8];
        file.read_exact(&mut magic).map_err(|e| {
            ContractError::unsupported_format(path.display().to_string(), format!("prefix: {e}"))
        })?;
        if &magic != STORE_MAGIC {
            return Err(ContractError::unsupported_format(
                path.display().to_string(),
                "bad magic",
            ));
        }

        let mut word = [0u8; 4];
        file.read_exact(&mut word)?;
        let version = u32::from_le_bytes(word);
        if version != FORMAT_VERSION {
            return Err(ContractError::unsupported_format(
                path.display().to_string(),
                format!("format version {version}, expected {FORMAT_VERSION}"),
            ));
        }

        let mut long = [0u8; 8];
        file.read_exact(&mut long)?;
        let toc_offset = u64::from_le_bytes(long);
        if toc_offset < PREFIX_LEN {
            return Err(ContractError::store_corrupt(
                path.display().to_string(),
                format!("TOC offset {toc_offset} inside prefix"),
            ));
        }

        file.seek(SeekFrom::Start(toc_offset))?;
        let mut toc_bytes = Vec::new();
        file.read_to_end(&mut toc_bytes)?;
        let sections: Vec<SectionEntry> = bincode::deserialize(&toc_bytes).map_err(|e| {
            ContractError::store_corrupt(path.display().to_string(), format!("TOC decode: {e}"))
        })?;

        trace!(path = %path.display(), sections = sections.len(), "container opened");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            sections,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all sections, in file order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    /// TOC entry for `name`, if present.
    pub fn section(&self, name: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Read bytes at an absolute file offset.
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), ContractError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Read one section in full.
    pub fn read_section(&mut self, name: &str) -> Result<Vec<u8>, ContractError> {
        let (offset, len) = match self.section(name) {
            Some(entry) => (entry.offset, entry.len),
            None => {
                return Err(ContractError::SectionMissing {
                    path: self.path.display().to_string(),
                    section: name.to_string(),
                })
            }
        };
        let mut buf = vec![0u8; len as usize];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Read and decode one bincode section.
    pub fn read_record<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, ContractError> {
        let bytes = self.read_section(name)?;
        bincode::deserialize(&bytes).map_err(|e| {
            ContractError::store_corrupt(
                self.path.display().to_string(),
                format!("decode section '{name}': {e}"),
            )
        })
    }
}

/// Write side of a container file.
///
/// Sections are appended in call order; `finish` writes the TOC and
/// backpatches its offset into the prefix.
pub struct ContainerWriter {
    path: PathBuf,
    file: BufWriter<File>,
    sections: Vec<SectionEntry>,
    cursor: u64,
}

impl ContainerWriter {
    /// Create a container, truncating any existing file.
    ///
    /// Parent directories are created as needed.
    pub fn create(path: &Path) -> Result<Self, ContractError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(STORE_MAGIC)?;
        file.write_all(&FORMAT_VERSION.to_le_bytes())?;
        file.write_all(&0u64.to_le_bytes())?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            sections: Vec::new(),
            cursor: PREFIX_LEN,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a raw section.
    pub fn write_section(&mut self, name: &str, bytes: &[u8]) -> Result<(), ContractError> {
        self.file.write_all(bytes)?;
        self.sections.push(SectionEntry {
            name: name.to_string(),
            offset: self.cursor,
            len: bytes.len() as u64,
        });
        self.cursor += bytes.len() as u64;
        Ok(())
    }

    /// Append a bincode-encoded section.
    pub fn write_record<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), ContractError> {
        let bytes = bincode::serialize(value).map_err(|e| {
            ContractError::store_corrupt(
                self.path.display().to_string(),
                format!("encode section '{name}': {e}"),
            )
        })?;
        self.write_section(name, &bytes)
    }

    /// Append an indexed events table: count, offset index, then the blobs.
    pub fn write_events<B: AsRef<[u8]>>(
        &mut self,
        name: &str,
        blobs: &[B],
    ) -> Result<(), ContractError> {
        let count = blobs.len() as u64;
        let start = self.cursor;

        self.file.write_all(&count.to_le_bytes())?;
        let mut running = 0u64;
        for blob in blobs {
            self.file.write_all(&running.to_le_bytes())?;
            running += blob.as_ref().len() as u64;
        }
        self.file.write_all(&running.to_le_bytes())?;
        for blob in blobs {
            self.file.write_all(blob.as_ref())?;
        }

        let len = 8 + (count + 1) * 8 + running;
        self.sections.push(SectionEntry {
            name: name.to_string(),
            offset: start,
            len,
        });
        self.cursor += len;
        Ok(())
    }

    /// Write the TOC, backpatch its offset, and sync the file.
    pub fn finish(self) -> Result<(), ContractError> {
        let Self {
            path,
            mut file,
            sections,
            cursor,
        } = self;

        let toc = bincode::serialize(&sections).map_err(|e| {
            ContractError::store_corrupt(path.display().to_string(), format!("encode TOC: {e}"))
        })?;
        file.write_all(&toc)?;
        file.flush()?;

        let mut inner = file.into_inner().map_err(|e| ContractError::Io(e.into_error()))?;
        inner.seek(SeekFrom::Start(12))?;
        inner.write_all(&cursor.to_le_bytes())?;
        inner.sync_all()?;
        trace!(path = %path.display(), sections = sections.len(), "container finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Marker {
        tag: String,
        value: f64,
    }

    #[test]
    fn round_trips_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.evd");

        let mut writer = ContainerWriter::create(&path).unwrap();
        writer
            .write_record(
                "marker",
                &Marker {
                    tag: "alpha".into(),
                    value: 0.25,
                },
            )
            .unwrap();
        writer.write_section("raw", b"opaque bytes").unwrap();
        writer.finish().unwrap();

        let mut container = Container::open(&path).unwrap();
        assert!(container.has_section("marker"));
        assert!(container.has_section("raw"));
        assert!(!container.has_section("events"));

        let marker: Marker = container.read_record("marker").unwrap();
        assert_eq!(marker.tag, "alpha");
        assert_eq!(marker.value, 0.25);
        assert_eq!(container.read_section("raw").unwrap(), b"opaque bytes");
    }

    #[test]
    fn missing_section_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.evd");
        ContainerWriter::create(&path).unwrap().finish().unwrap();

        let mut container = Container::open(&path).unwrap();
        let err = container.read_section("header").unwrap_err();
        assert!(matches!(err, ContractError::SectionMissing { .. }));
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_a_store.evd");
        fs::write(&path, b"JUNKJUNKJUNKJUNKJUNKJUNK").unwrap();

        let err = Container::open(&path).unwrap_err();
        assert!(matches!(err, ContractError::UnsupportedFormat { .. }));
    }

    #[test]
    fn rejects_future_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.evd");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(STORE_MAGIC);
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&PREFIX_LEN.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let err = Container::open(&path).unwrap_err();
        assert!(err.to_string().contains("format version 99"), "got: {err}");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c/store.evd");
        ContainerWriter::create(&path).unwrap().finish().unwrap();
        assert!(path.exists());
    }
}
