use std::path::PathBuf;
use std::time::Duration;

use riff_storage::StorageOptions;
use serde::{Deserialize, Serialize};

use crate::recording::CaptureLimits;

/// Default backend used by the development stack
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8081/auth-callback";
pub const DEFAULT_SPOTIFY_CLIENT_ID: &str = "738024374a41414383cec879914473f6";
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-email",
    "user-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

// ===== Client Configuration =====

/// Static client configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing `/api`
    pub backend_url: String,
    /// OAuth client id registered with the music service
    pub spotify_client_id: String,
    /// Callback registered with the music service
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout_secs: Option<u64>,
    /// Largest audio payload the client will upload. `None` disables the check.
    pub max_upload_bytes: Option<u64>,
    /// Alternate text-analysis endpoint tried once when the primary returns non-2xx
    pub analyze_text_fallback_path: Option<String>,
    /// Where native recordings are written before upload
    pub recordings_dir: PathBuf,
    pub max_recording_secs: Option<u64>,
    pub max_recording_bytes: Option<u64>,
    /// JSON file used when the token lives in file storage
    pub storage_file: PathBuf,
    /// Keychain service name used when the token lives in the keychain
    pub keychain_service: String,
    /// Send the caller's approximate location with recommendation requests.
    /// Per process only; the session token is the one persisted value.
    pub geo_ip: bool,
    /// Create exported playlists as public
    pub public_playlists: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let storage = StorageOptions::default();
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            spotify_client_id: DEFAULT_SPOTIFY_CLIENT_ID.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            request_timeout_secs: None,
            max_upload_bytes: None,
            analyze_text_fallback_path: None,
            recordings_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("riff")
                .join("recordings"),
            max_recording_secs: None,
            max_recording_bytes: None,
            storage_file: storage.file_path,
            keychain_service: storage.service,
            geo_ip: false,
            public_playlists: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `RIFF_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("RIFF_BACKEND_URL") {
            config.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(id) = get("RIFF_SPOTIFY_CLIENT_ID") {
            config.spotify_client_id = id;
        }
        if let Some(uri) = get("RIFF_REDIRECT_URI") {
            config.redirect_uri = uri;
        }
        if let Some(scopes) = get("RIFF_SCOPES") {
            config.scopes = scopes.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = get("RIFF_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = Some(parse_u64("RIFF_REQUEST_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("RIFF_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = Some(parse_u64("RIFF_MAX_UPLOAD_BYTES", &value)?);
        }
        if let Some(path) = get("RIFF_ANALYZE_FALLBACK_PATH") {
            config.analyze_text_fallback_path = Some(path);
        }
        if let Some(dir) = get("RIFF_RECORDINGS_DIR") {
            config.recordings_dir = PathBuf::from(dir);
        }
        if let Some(value) = get("RIFF_MAX_RECORDING_SECS") {
            config.max_recording_secs = Some(parse_u64("RIFF_MAX_RECORDING_SECS", &value)?);
        }
        if let Some(value) = get("RIFF_MAX_RECORDING_BYTES") {
            config.max_recording_bytes = Some(parse_u64("RIFF_MAX_RECORDING_BYTES", &value)?);
        }
        if let Some(path) = get("RIFF_STORAGE_FILE") {
            config.storage_file = PathBuf::from(path);
        }
        if let Some(service) = get("RIFF_KEYCHAIN_SERVICE") {
            config.keychain_service = service;
        }
        if let Some(value) = get("RIFF_GEO_IP") {
            config.geo_ip = parse_bool("RIFF_GEO_IP", &value)?;
        }
        if let Some(value) = get("RIFF_PUBLIC_PLAYLISTS") {
            config.public_playlists = parse_bool("RIFF_PUBLIC_PLAYLISTS", &value)?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn capture_limits(&self) -> CaptureLimits {
        CaptureLimits {
            max_bytes: self.max_recording_bytes,
            max_duration: self.max_recording_secs.map(Duration::from_secs),
        }
    }

    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            service: self.keychain_service.clone(),
            file_path: self.storage_file.clone(),
        }
    }
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            expected: "a non-negative integer",
            value: value.to_string(),
        })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            expected: "true or false",
            value: value.to_string(),
        }),
    }
}
