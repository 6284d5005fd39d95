//! Key-value stores backing the persisted achievement slot.
//!
//! The host platform provides a synchronous key-value store; these are the
//! two shapes the tracker ships with. `MemoryStore` hands out shared handles
//! (the execution model is single-threaded and cooperative), `FileStore`
//! keeps one file per key and commits writes with a temp-file rename.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use error::TrackerError;

/// Synchronous key-value storage, as provided by the host platform.
pub trait KvStore {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), TrackerError>;

    /// Removes the value stored under `key`, if any.
    fn remove(&mut self, key: &str) -> Result<(), TrackerError>;
}

/// In-memory store with shared handles.
///
/// Cloning yields a handle onto the same underlying map, so a host (or a
/// test) can keep a handle while the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TrackerError> {
        self.inner.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TrackerError> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

/// File-backed store keeping one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates, if needed) the storage directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir).context("Failed to create storage directory")?;
        }
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.dat"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TrackerError> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).context("Failed to create temporary file")?;
        file.write_all(value.as_bytes()).context("Failed to write stored value")?;
        file.flush().context("Failed to flush stored value")?;

        fs::rename(temp_path, path).context("Failed to commit stored value")?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TrackerError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path).context("Failed to remove stored value")?;
        }
        Ok(())
    }
}
