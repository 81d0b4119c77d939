//! Playlist export: turn a recommendation list into a playlist on the user's
//! music-service account.
//!
//! Export is not idempotent. Two calls with the same options create two
//! playlists; callers that want one playlist per result must guard the
//! trigger themselves.

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{EmotionResult, Song};
use crate::clients::{Backend, ClientError, Location};
use crate::session::SessionContext;

pub const DEFAULT_PLAYLIST_NAME: &str = "Riff AI Playlist";
pub const DEFAULT_DESCRIPTION: &str = "Created by Riff AI";
pub const DEFAULT_LOCATION_DESCRIPTION: &str = "Created with Riff AI based on location and mood.";

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("Not logged in")]
    MissingCredential,
    #[error("No songs to add to the playlist")]
    EmptySongList,
    #[error(transparent)]
    Client(ClientError),
}

impl From<ClientError> for PlaylistError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::MissingCredential => PlaylistError::MissingCredential,
            other => PlaylistError::Client(other),
        }
    }
}

impl PlaylistError {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            PlaylistError::MissingCredential => "Please log in with Spotify first".to_string(),
            PlaylistError::EmptySongList => "No songs provided to create playlist.".to_string(),
            PlaylistError::Client(e) => e.user_message(),
        }
    }
}

/// Body of the create-playlist call. Built per export, never retained.
///
/// Songs go out whole; the backend resolves tracks from their links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistRequest {
    pub name: String,
    pub description: String,
    #[serde(rename = "public")]
    pub is_public: bool,
    pub songs: Vec<Song>,
}

/// Whatever the backend returns for the new playlist
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaylistHandle {
    #[serde(default, alias = "playlist_id")]
    pub id: Option<String>,
    #[serde(default, alias = "playlist_url", alias = "external_url")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Input to [`PlaylistExporter::create_playlist`]
#[derive(Debug, Clone, Default)]
pub struct PlaylistOptions {
    pub emotion: Option<String>,
    pub mood: Option<String>,
    /// Country name for location-based playlists
    pub country: Option<String>,
    /// Explicit name, skips name derivation
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
    pub songs: Vec<Song>,
}

impl PlaylistOptions {
    /// Options for exporting `songs` recommended for `emotion`. A detected
    /// location turns this into a location playlist ("Ireland Joy Vibes").
    pub fn from_analysis(
        emotion: &EmotionResult,
        location: Option<&Location>,
        songs: Vec<Song>,
    ) -> Self {
        Self {
            emotion: Some(emotion.emotion.clone()),
            mood: Some(emotion.mood.to_string()),
            country: location.and_then(|l| l.country.clone()),
            songs,
            ..Default::default()
        }
    }

    pub fn derived_name(&self) -> String {
        if let Some(name) = non_blank(self.name.as_deref()) {
            return name.to_string();
        }
        match non_blank(self.country.as_deref()) {
            Some(country) => location_playlist_name(Some(country), self.emotion.as_deref()),
            None => playlist_name(self.emotion.as_deref(), self.mood.as_deref()),
        }
    }

    fn into_request(self) -> PlaylistRequest {
        let name = self.derived_name();
        let description = match non_blank(self.description.as_deref()) {
            Some(description) => description.to_string(),
            None if non_blank(self.country.as_deref()).is_some() => {
                DEFAULT_LOCATION_DESCRIPTION.to_string()
            }
            None => DEFAULT_DESCRIPTION.to_string(),
        };
        PlaylistRequest {
            name,
            description,
            is_public: self.is_public,
            songs: self.songs,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "Joy positive Vibes", "Joy Vibes", "Positive Vibes", else the default.
pub fn playlist_name(emotion: Option<&str>, mood: Option<&str>) -> String {
    let emotion = non_blank(emotion).map(str::to_lowercase);
    let mood = non_blank(mood).map(str::to_lowercase);

    match (emotion, mood) {
        (Some(emotion), Some(mood)) => format!("{} {} Vibes", capitalize(&emotion), mood),
        (Some(emotion), None) => format!("{} Vibes", capitalize(&emotion)),
        (None, Some(mood)) => format!("{} Vibes", capitalize(&mood)),
        (None, None) => DEFAULT_PLAYLIST_NAME.to_string(),
    }
}

/// "Ireland Joy Vibes", "Joy Vibes", "Ireland Mix", else the default.
pub fn location_playlist_name(country: Option<&str>, emotion: Option<&str>) -> String {
    let country = non_blank(country);
    let emotion = non_blank(emotion).map(|e| capitalize(&e.to_lowercase()));

    match (country, emotion) {
        (Some(country), Some(emotion)) => format!("{} {} Vibes", country, emotion),
        (None, Some(emotion)) => format!("{} Vibes", emotion),
        (Some(country), None) => format!("{} Mix", country),
        (None, None) => DEFAULT_PLAYLIST_NAME.to_string(),
    }
}

pub struct PlaylistExporter {
    backend: Arc<dyn Backend>,
    session: Arc<SessionContext>,
}

impl PlaylistExporter {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionContext>) -> Self {
        Self { backend, session }
    }

    /// Create a playlist from `options`. Checks login, then the song list,
    /// and only then calls the backend.
    pub async fn create_playlist(
        &self,
        options: PlaylistOptions,
    ) -> Result<PlaylistHandle, PlaylistError> {
        if !self.session.is_authenticated() {
            return Err(PlaylistError::MissingCredential);
        }
        if options.songs.is_empty() {
            return Err(PlaylistError::EmptySongList);
        }

        let request = options.into_request();
        info!(
            "Creating playlist '{}' with {} song(s)",
            request.name,
            request.songs.len()
        );

        match self.backend.create_playlist(&request).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                warn!("Playlist creation failed: {}", e);
                Err(e.into())
            }
        }
    }
}
