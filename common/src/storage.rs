// common/src/storage.rs
//! Origin-scoped key-value storage.
//!
//! The session store only needs string keys and string values, the same
//! surface a browser gives a single origin. Two media are provided: an
//! in-memory map for tests and ephemeral hosts, and a JSON file that
//! survives process restarts.

use crate::error::AuthError;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A flat string-to-string store scoped to one origin.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written map behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        tracing::info!("Using session storage file {}", path.display());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parse_map(&self, raw: &str) -> Result<BTreeMap<String, String>, AuthError> {
        serde_json::from_str(raw).map_err(|e| {
            AuthError::Storage(format!("{} is not a JSON object of strings: {}", self.path.display(), e))
        })
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, AuthError> {
        match self.read_raw()? {
            Some(raw) => self.parse_map(&raw),
            None => Ok(BTreeMap::new()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), AuthError> {
        let body = serde_json::to_vec_pretty(map).map_err(|e| AuthError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), AuthError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // A corrupt file holds no usable entries; writing starts over
        let mut map = match self.read_raw()? {
            Some(raw) => self.parse_map(&raw).unwrap_or_else(|e| {
                tracing::warn!("Replacing unreadable storage: {}", e);
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        apply(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.update(|map| {
            map.remove(key);
        })
    }
}
