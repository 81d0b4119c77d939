use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ClientError;
use super::geoip::Location;
use crate::analysis::{EmotionResult, Mood, Song};
use crate::playlist::{PlaylistHandle, PlaylistRequest};
use crate::recording::AudioPayload;
use crate::session::Credential;

/// Which text-analysis endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AnalysisRoute {
    Primary,
    /// Alternate endpoint tried once after the primary fails
    Fallback,
}

/// The music-service account behind the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl Profile {
    /// `display_name`, else `id`, else "Guest"
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.id.as_deref())
            .unwrap_or("Guest")
    }
}

/// Calls the backend makes available to the client.
///
/// `BackendClient` talks HTTP; tests substitute scripted fakes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Trade an OAuth authorization code for a bearer credential. No auth.
    async fn exchange_code(&self, code: &str) -> Result<Credential, ClientError>;

    async fn profile(&self) -> Result<Profile, ClientError>;

    /// Tell the backend the session is over. No auth required.
    async fn logout(&self) -> Result<(), ClientError>;

    async fn analyze_text(
        &self,
        text: &str,
        route: AnalysisRoute,
    ) -> Result<EmotionResult, ClientError>;

    async fn analyze_audio(&self, payload: &AudioPayload) -> Result<EmotionResult, ClientError>;

    async fn recommendations(
        &self,
        emotion: &str,
        mood: Mood,
        location: Option<&Location>,
    ) -> Result<Vec<Song>, ClientError>;

    /// Not idempotent: every call creates a new playlist.
    async fn create_playlist(&self, request: &PlaylistRequest)
        -> Result<PlaylistHandle, ClientError>;
}
