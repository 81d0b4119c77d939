//! Platform key-value storage.
//!
//! This crate provides a small, uniform `get`/`set`/`remove` interface over
//! the places a client can keep a string credential: the OS keychain on
//! devices, a JSON file standing in for browser-local storage, or plain
//! process memory.
//!
//! # Example
//!
//! ```no_run
//! use riff_storage::{open, StorageKind, StorageOptions};
//!
//! fn main() -> Result<(), riff_storage::StorageError> {
//!     let storage = open(StorageKind::detect(), &StorageOptions::default())?;
//!     storage.set("access_token", "abc")?;
//!     assert_eq!(storage.get("access_token")?, Some("abc".to_string()));
//!     storage.remove("access_token")
//! }
//! ```

mod file;
mod keychain;
mod memory;
mod platform;

pub use file::FileStorage;
pub use keychain::KeychainStorage;
pub use memory::MemoryStorage;
pub use platform::StorageKind;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when talking to a storage backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The OS credential store rejected the operation.
    #[error("keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A key-value store for small string values.
///
/// Removing a key that does not exist succeeds.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Settings used when constructing a backend with [`open`].
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Keychain service name.
    pub service: String,
    /// Location of the JSON file used by [`StorageKind::File`].
    pub file_path: PathBuf,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            service: "riff.client".to_string(),
            file_path: default_file_path(),
        }
    }
}

/// `storage.json` under the per-user local data directory.
///
/// Falls back to the working directory when the platform reports no data
/// directory, never to the shared temp directory.
pub fn default_file_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("riff")
        .join("storage.json")
}

/// Build the backend for `kind`.
pub fn open(kind: StorageKind, options: &StorageOptions) -> Result<Arc<dyn Storage>, StorageError> {
    log::info!("Opening {} storage", kind);

    let storage: Arc<dyn Storage> = match kind {
        StorageKind::Keychain => Arc::new(KeychainStorage::new(options.service.clone())),
        StorageKind::File => Arc::new(FileStorage::new(options.file_path.clone())),
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
    };

    Ok(storage)
}
