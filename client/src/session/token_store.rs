use std::fmt;
use std::sync::Arc;

use log::debug;
use riff_storage::{Storage, StorageError};
use secrecy::{ExposeSecret, SecretString};

/// Fixed key the bearer credential is stored under
pub const TOKEN_KEY: &str = "access_token";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SessionError {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        "Could not access saved login. Please log in again.".to_string()
    }
}

/// Opaque bearer credential. Never printed.
pub struct Credential(SecretString);

impl Credential {
    /// Blank strings are not credentials.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(SecretString::from(value)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self(SecretString::from(self.expose().to_owned()))
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Persists the single credential entry. Storage calls may block (keychain
/// prompts, file I/O), so they run on the blocking pool.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<Option<Credential>, SessionError> {
        let storage = self.storage.clone();
        let value = tokio::task::spawn_blocking(move || storage.get(TOKEN_KEY)).await??;
        debug!("Loaded credential: present={}", value.is_some());
        Ok(value.and_then(Credential::new))
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), SessionError> {
        let storage = self.storage.clone();
        let value = credential.expose().to_owned();
        tokio::task::spawn_blocking(move || storage.set(TOKEN_KEY, &value)).await??;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || storage.remove(TOKEN_KEY)).await??;
        Ok(())
    }
}
