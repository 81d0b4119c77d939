use std::fmt;
use std::str::FromStr;

/// Environment variable that forces a storage backend.
pub const STORAGE_OVERRIDE_VAR: &str = "RIFF_STORAGE";

/// Which backend a process keeps its values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// OS keychain (device-local)
    Keychain,
    /// JSON file (browser-local equivalent)
    File,
    /// Process memory, lost on exit
    Memory,
}

impl StorageKind {
    /// Pick a backend from the runtime environment.
    ///
    /// Meant to be called once at startup; the result is passed to
    /// [`crate::open`] rather than re-detected per call.
    pub fn detect() -> Self {
        if let Ok(value) = std::env::var(STORAGE_OVERRIDE_VAR) {
            match value.parse() {
                Ok(kind) => return kind,
                Err(()) => log::warn!(
                    "Ignoring unknown {}={:?}, detecting instead",
                    STORAGE_OVERRIDE_VAR,
                    value
                ),
            }
        }

        Self::platform_default()
    }

    #[cfg(any(target_os = "macos", target_os = "windows", target_os = "ios"))]
    fn platform_default() -> Self {
        StorageKind::Keychain
    }

    // The kernel keyring does not outlive the login session, so other
    // platforms keep the token in a file.
    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "ios")))]
    fn platform_default() -> Self {
        StorageKind::File
    }
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" | "keyring" => Ok(StorageKind::Keychain),
            "file" | "local" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Keychain => "keychain",
            StorageKind::File => "file",
            StorageKind::Memory => "memory",
        };
        f.write_str(name)
    }
}
