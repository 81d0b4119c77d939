//! HTTP implementation of [`Backend`].
//!
//! Every request goes through [`BackendClient::request`], which attaches the
//! bearer credential when one exists and refuses to build an authenticated
//! request without one.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::backend::{AnalysisRoute, Backend, Profile};
use super::error::ClientError;
use super::geoip::Location;
use crate::analysis::models::RecommendationsResponse;
use crate::analysis::{EmotionResult, Mood, Song};
use crate::config::ClientConfig;
use crate::playlist::{PlaylistHandle, PlaylistRequest};
use crate::recording::AudioPayload;
use crate::session::{Credential, SessionContext};

const SPOTIFY_TOKEN_PATH: &str = "/api/auth/spotify-token/";
const PROFILE_PATH: &str = "/api/auth/profile/";
const LOGOUT_PATH: &str = "/api/auth/logout/";
const ANALYZE_TEXT_PATH: &str = "/api/analyze_text/";
const ANALYZE_AUDIO_PATH: &str = "/api/analyze_audio/";
const RECOMMENDATIONS_PATH: &str = "/api/get_mood_recommendations/";
const CREATE_PLAYLIST_PATH: &str = "/api/auth/create-playlist/";

/// Whether a call needs the bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Required,
    /// Attach the credential if there is one, but don't insist
    Optional,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionContext>,
    max_upload_bytes: Option<u64>,
    analyze_fallback_path: Option<String>,
}

impl BackendClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionContext>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let base_url = config.backend_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            http,
            base_url,
            session,
            max_upload_bytes: config.max_upload_bytes,
            analyze_fallback_path: config.analyze_text_fallback_path.clone(),
        })
    }

    /// The underlying reqwest client, shared with other HTTP collaborators
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn authorized(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
    ) -> Result<RequestBuilder, ClientError> {
        let credential = self.session.credential();
        if auth == Auth::Required && credential.is_none() {
            debug!("Refusing {} {} without a credential", method, path);
            return Err(ClientError::MissingCredential);
        }

        let mut builder = self.http.request(method, self.url(path));
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }
        Ok(builder)
    }

    /// JSON request to `path`. Fails with `MissingCredential` before any I/O
    /// when `auth` is required and the session has no credential.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(self
            .authorized(method, path, auth)?
            .header(CONTENT_TYPE, "application/json"))
    }

    /// Multipart request to `path`. The content type (with boundary) is left
    /// to reqwest.
    pub fn upload_request(&self, path: &str, auth: Auth) -> Result<RequestBuilder, ClientError> {
        self.authorized(Method::POST, path, auth)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse response: {}", e);
            ClientError::Decode(e.to_string())
        })
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let response = request.send().await.map_err(|e| {
            error!("Request error: {}", e);
            ClientError::from(e)
        })?;

        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Backend error response from {} ({}): {}", url, status, body);
            return Err(ClientError::from_response(status, &body));
        }
        debug!("{} -> {}", url, status);
        Ok(body)
    }

    fn analyze_text_path(&self, route: AnalysisRoute) -> Result<&str, ClientError> {
        match route {
            AnalysisRoute::Primary => Ok(ANALYZE_TEXT_PATH),
            AnalysisRoute::Fallback => self.analyze_fallback_path.as_deref().ok_or_else(|| {
                ClientError::InvalidUrl("no fallback analysis endpoint configured".to_string())
            }),
        }
    }
}

fn recommendations_body(emotion: &str, mood: Mood, location: Option<&Location>) -> serde_json::Value {
    match location {
        None => json!({ "emotion": emotion, "mood": mood }),
        Some(location) => json!({
            "emotion": emotion.to_lowercase(),
            "mood": mood,
            "country_code": location.country_code.as_deref().unwrap_or("").to_uppercase(),
            "city": location.city.as_deref().unwrap_or("").to_lowercase(),
            "country": location.country.as_deref().unwrap_or(""),
        }),
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn exchange_code(&self, code: &str) -> Result<Credential, ClientError> {
        let request = self
            .request(Method::POST, SPOTIFY_TOKEN_PATH, Auth::Optional)?
            .json(&json!({ "code": code }));
        let response: TokenResponse = self.send(request).await?;

        response
            .access_token
            .and_then(Credential::new)
            .ok_or_else(|| ClientError::Decode("response has no access_token".to_string()))
    }

    async fn profile(&self) -> Result<Profile, ClientError> {
        let request = self.request(Method::GET, PROFILE_PATH, Auth::Required)?;
        self.send(request).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let request = self.request(Method::POST, LOGOUT_PATH, Auth::Optional)?;
        self.send_raw(request).await.map(|_| ())
    }

    async fn analyze_text(
        &self,
        text: &str,
        route: AnalysisRoute,
    ) -> Result<EmotionResult, ClientError> {
        let path = self.analyze_text_path(route)?;
        let request = self
            .request(Method::POST, path, Auth::Required)?
            .json(&json!({ "text": text }));
        let result: EmotionResult = self.send(request).await?;
        info!("Text analysis ({}): {}", route, result);
        Ok(result)
    }

    async fn analyze_audio(&self, payload: &AudioPayload) -> Result<EmotionResult, ClientError> {
        let request = self.upload_request(ANALYZE_AUDIO_PATH, Auth::Required)?;

        let size_bytes = payload.size_bytes()?;
        if let Some(limit_bytes) = self.max_upload_bytes {
            if size_bytes > limit_bytes {
                return Err(ClientError::PayloadTooLarge {
                    size_bytes,
                    limit_bytes,
                });
            }
        }

        let bytes = payload.read_bytes().await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(payload.upload_file_name())
            .mime_str(&payload.mime_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        info!(
            "Uploading {} ({} bytes)",
            payload.upload_file_name(),
            size_bytes
        );
        let result: EmotionResult = self.send(request.multipart(form)).await?;
        info!("Audio analysis: {}", result);
        Ok(result)
    }

    async fn recommendations(
        &self,
        emotion: &str,
        mood: Mood,
        location: Option<&Location>,
    ) -> Result<Vec<Song>, ClientError> {
        let request = self
            .request(Method::POST, RECOMMENDATIONS_PATH, Auth::Required)?
            .json(&recommendations_body(emotion, mood, location));
        let response: RecommendationsResponse = self.send(request).await?;

        if let Some(message) = response.error {
            return Err(ClientError::Backend {
                status: 200,
                message,
            });
        }
        info!("Received {} recommendation(s)", response.songs.len());
        Ok(response.songs)
    }

    async fn create_playlist(
        &self,
        request: &PlaylistRequest,
    ) -> Result<PlaylistHandle, ClientError> {
        let builder = self
            .request(Method::POST, CREATE_PLAYLIST_PATH, Auth::Required)?
            .json(request);
        self.send(builder).await
    }
}
