//! # Queue Storage
//!
//! Durable string-keyed slots for the persisted queue. The queue writes the
//! whole JSON array to one slot after every mutation and reads it back once
//! at construction.
//!
//! - `FileStorage`: one `<dir>/<key>.json` file per key, replaced atomically
//! - `MemoryStorage`: in-process map, for tests and ephemeral queues

use crate::shared::error::QueueError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// A persistent key-value store holding string slots
pub trait QueueStorage: Send + Sync {
    /// Read a slot; `Ok(None)` when it was never written
    fn read(&self, key: &str) -> Result<Option<String>, QueueError>;

    /// Replace a slot
    fn write(&self, key: &str, value: &str) -> Result<(), QueueError>;
}

/// File-backed storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl QueueStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, QueueError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QueueError::storage(key, format!("{}: {}", path.display(), e))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), QueueError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| QueueError::storage(key, format!("{}: {}", self.dir.display(), e)))?;

        // Write next to the target and rename over it so readers never see a partial slot
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)
            .map_err(|e| QueueError::storage(key, format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| QueueError::storage(key, format!("{}: {}", path.display(), e)))?;

        Ok(())
    }
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot, e.g. to simulate state left by an earlier run
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut slots) = storage.slots.lock() {
            slots.insert(key.into(), value.into());
        }
        storage
    }
}

impl QueueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, QueueError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| QueueError::storage(key, "storage lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), QueueError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| QueueError::storage(key, "storage lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
