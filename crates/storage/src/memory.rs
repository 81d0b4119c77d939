use std::collections::HashMap;
use std::sync::Mutex;

use crate::{Storage, StorageError};

/// In-process storage. Values live as long as the instance.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_lifecycle() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("access_token").unwrap(), None);

        storage.set("access_token", "first").unwrap();
        storage.set("access_token", "second").unwrap();
        assert_eq!(
            storage.get("access_token").unwrap(),
            Some("second".to_string())
        );

        storage.remove("access_token").unwrap();
        assert_eq!(storage.get("access_token").unwrap(), None);

        // Removing twice is fine
        storage.remove("access_token").unwrap();
    }
}
