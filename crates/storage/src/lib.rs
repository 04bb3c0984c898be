//! Storage layer: the persisted fingerprint database.
//!
//! Holds the record types and the JSON-backed store. The store is read fully
//! at startup and rewritten fully (temp file + atomic rename) on every save.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not replace store file {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Cheap content-identity proxy: byte size plus whole-second mtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub size: u64,
    pub mtime: i64,
}

/// What the store remembers about one successfully processed video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    #[serde(default)]
    pub video: Option<Fingerprint>,
    #[serde(default)]
    pub subs: Option<Fingerprint>,
    #[serde(default)]
    pub processed_at: i64,
}

impl FingerprintRecord {
    pub fn matches(&self, video: Option<Fingerprint>, subs: Option<Fingerprint>) -> bool {
        self.video == video && self.subs == subs
    }
}

/// Keyed by canonical absolute video path. Single writer: callers hold it by
/// `&mut` for the lifetime of the service.
#[derive(Debug)]
pub struct FingerprintStore {
    path: PathBuf,
    records: BTreeMap<String, FingerprintRecord>,
}

impl FingerprintStore {
    /// Loads the store at `path`. A missing, unreadable or corrupt file yields
    /// an empty store; the service then reprocesses everything it sees.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Could not parse processed DB {:?}, starting empty: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No processed DB at {:?}, starting empty", path);
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Could not read processed DB {:?}, starting empty: {}", path, e);
                BTreeMap::new()
            }
        };
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&FingerprintRecord> {
        self.records.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, record: FingerprintRecord) {
        self.records.insert(key.into(), record);
    }

    pub fn remove(&mut self, key: &str) -> Option<FingerprintRecord> {
        self.records.remove(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FingerprintRecord)> {
        self.records.iter()
    }

    /// Serialized form of the whole store, as written by `save`.
    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec_pretty(&self.records)?)
    }

    /// Writes the whole map to a temp file in the destination directory and
    /// renames it over the store file. The previous file stays intact until
    /// the rename.
    pub fn save(&self) -> Result<(), StoreError> {
        write_atomic(&self.path, &self.to_json()?)?;
        debug!("Saved processed DB {:?} ({} records)", self.path, self.records.len());
        Ok(())
    }
}

/// Temp file beside `path`, fsync, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
        path: dir.clone(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|source| StoreError::Io {
        path: dir.clone(),
        source,
    })?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|source| StoreError::Io {
            path: tmp.path().to_path_buf(),
            source,
        })?;
    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
