//! Byte-level access to the backing tables.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::store::StoreError;

/// A read-only, byte-addressable table.
///
/// Implementations perform one bounded, synchronous read per call and never
/// retry; the cache above decides how often to call.
pub trait TableSource: Send + Sync {
    /// Read the raw table contents.
    fn read(&self) -> Result<Vec<u8>, StoreError>;

    /// Human-readable location, used in log events.
    fn describe(&self) -> String;
}

/// A table stored as a file on local disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for FileSource {
    fn read(&self) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An in-memory table whose contents can be swapped at runtime.
///
/// `None` behaves like a missing file.
#[derive(Debug, Default)]
pub struct MemorySource {
    contents: Mutex<Option<Vec<u8>>>,
}

impl MemorySource {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    /// A source that fails every read.
    pub fn missing() -> Self {
        Self::default()
    }

    /// Replace the table contents.
    pub fn set(&self, contents: impl Into<Vec<u8>>) {
        *self.lock() = Some(contents.into());
    }

    /// Make subsequent reads fail.
    pub fn remove(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TableSource for MemorySource {
    fn read(&self) -> Result<Vec<u8>, StoreError> {
        self.lock().clone().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "in-memory table is empty",
            ))
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
