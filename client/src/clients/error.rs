use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Backend returned status {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("Not logged in")]
    MissingCredential,
    #[error("Payload too large: {size_bytes} bytes (limit {limit_bytes})")]
    PayloadTooLarge { size_bytes: u64, limit_bytes: u64 },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The request could not be built (bad header, MIME type or URL)
    #[error("Invalid request: {0}")]
    Request(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClientError {
    /// Build a backend error from a non-2xx status and its raw body.
    ///
    /// The message is the JSON `error` field when present, then `detail`,
    /// then the trimmed body, then the status reason.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                ["error", "detail"].iter().find_map(|field| {
                    json.get(*field)
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
            })
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        ClientError::Backend {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Backend { status: 401, .. } => {
                "Spotify authorization failed. Please try logging in again.".to_string()
            }
            ClientError::Backend { status: 429, .. } => {
                "Too many requests. Please wait and retry.".to_string()
            }
            ClientError::Backend { message, .. } => message.clone(),
            ClientError::MissingCredential => "Please log in with Spotify first.".to_string(),
            ClientError::PayloadTooLarge { size_bytes, .. } => {
                let mb = size_bytes / (1024 * 1024);
                format!("Recording too large ({}MB). Try a shorter one.", mb)
            }
            ClientError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ClientError::InvalidUrl(_) => "The server address is misconfigured.".to_string(),
            ClientError::Request(_) => "Could not prepare the request. Please try again.".to_string(),
            ClientError::IoError(_) => "Failed to read the recording. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if e.is_builder() {
            ClientError::Request(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
