use reqwest::Url;

use crate::config::ClientConfig;

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization code not found.")]
    MissingCode,
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Client(#[from] crate::clients::ClientError),
    #[error(transparent)]
    Session(#[from] crate::session::SessionError),
}

impl AuthError {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingCode => "Authorization code not found.".to_string(),
            AuthError::Denied(_) => "Spotify login was cancelled.".to_string(),
            AuthError::InvalidUrl(_) => "Authentication failed.".to_string(),
            AuthError::Client(e) => e.user_message(),
            AuthError::Session(e) => e.user_message(),
        }
    }
}

/// Parameters of the music-service authorize redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl AuthorizationRequest {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client_id: config.spotify_client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
        }
    }

    /// URL to open in the platform browser
    pub fn url(&self) -> Result<Url, AuthError> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))
    }
}

/// Pull the authorization code out of the callback URL the service
/// redirected to.
pub fn extract_authorization_code(callback_url: &str) -> Result<String, AuthError> {
    let url = Url::parse(callback_url.trim())
        .map_err(|e| AuthError::InvalidUrl(format!("{}: {}", callback_url, e)))?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" => return Err(AuthError::Denied(value.into_owned())),
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            _ => {}
        }
    }
    code.ok_or(AuthError::MissingCode)
}
