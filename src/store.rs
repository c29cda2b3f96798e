//! Backing-file access for the key registry.
//!
//! The whole store is a single pretty-printed JSON array. Every call reads
//! or rewrites the entire file; nothing is cached between calls.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{
    error::{StoreError, StoreResult},
    model::KeyRecord,
};

/// Indentation of the persisted array, kept for human inspection.
const INDENT: &[u8] = b"    ";

/// The JSON file holding every key record.
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
}

impl KeyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records in file order.
    ///
    /// A missing file is an empty store. Content that is not JSON at all is
    /// logged, overwritten with an empty array and reported as empty. Valid
    /// JSON that is not an array of records is left on disk untouched and
    /// returned as [`StoreError::InvalidData`].
    pub fn load(&self) -> StoreResult<Vec<KeyRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Keys file {:?} does not exist yet", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Keys file {:?} is empty or corrupt ({}), resetting to an empty store",
                    self.path, e
                );
                self.save(&[])?;
                return Ok(Vec::new());
            }
        };

        serde_json::from_value(value).map_err(|e| {
            StoreError::InvalidData(format!(
                "{} is not an array of key records: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replace the file with `records`.
    ///
    /// Written to a sibling temp file, synced, then renamed over the target
    /// so readers see either the old or the new content.
    pub fn save(&self, records: &[KeyRecord]) -> StoreResult<()> {
        let mut contents = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut contents, PrettyFormatter::with_indent(INDENT));
        records.serialize(&mut serializer)?;

        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    /// Create the file with an empty array if it does not exist.
    ///
    /// Returns `true` when a new file was written.
    pub fn initialize(&self) -> StoreResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&[])?;
        Ok(true)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}
