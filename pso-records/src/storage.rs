//! Durable keyed byte storage.
//!
//! Keys are relative slash-separated paths such as
//! `system/players/account_alice.nsa`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

/// Whole-file read and write by key.
pub trait Storage: Send + Sync {
    /// Read every byte stored under `key`.
    ///
    /// # Errors
    /// [`io::ErrorKind::NotFound`] when nothing is stored, or any I/O error.
    fn read(&self, key: &str) -> io::Result<Vec<u8>>;

    /// Store `bytes` under `key`, replacing any previous contents.
    ///
    /// # Errors
    /// Any I/O error.
    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Storage rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Resolve keys relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Storage for FsStorage {
    fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.path_for(key))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "File written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Storage held in a map, for tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the bytes stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().get(key).cloned()
    }

    /// Whether anything is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().contains_key(key)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {key}")))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.files.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
