use keyring::Entry;
use log::{debug, error, info};

use crate::{Storage, StorageError};

/// Device-local secure storage backed by the OS keychain.
///
/// Each key becomes one keychain account under a shared service name.
#[derive(Debug, Clone)]
pub struct KeychainStorage {
    service: String,
}

impl KeychainStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Storage for KeychainStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        debug!("Loading '{}' from keychain service '{}'", key, self.service);

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("No keychain entry for '{}'", key);
                Ok(None)
            }
            Err(e) => {
                error!("Error loading '{}' from keychain: {}", key, e);
                Err(e.into())
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self.entry(key)?.set_password(value) {
            Ok(()) => {
                info!("Saved '{}' to keychain", key);
                Ok(())
            }
            Err(e) => {
                error!("Failed to save '{}' to keychain: {}", key, e);
                Err(e.into())
            }
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                info!("Deleted '{}' from keychain", key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                error!("Error deleting '{}' from keychain: {}", key, e);
                Err(e.into())
            }
        }
    }
}
