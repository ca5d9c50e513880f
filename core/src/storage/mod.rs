//! Client-local key/value storage
//!
//! The banner engine never reaches for ambient global storage. Whatever
//! persists dismissals is handed in as a [`KeyValueStore`], so tests can use
//! [`MemoryStore`] and the CLI a [`FileStore`] on disk.

mod file;
mod memory;

use std::path::PathBuf;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable string-keyed store local to one client
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key has never been written.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one. Durable once this returns.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// Errors raised by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt storage file {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
