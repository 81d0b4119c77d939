use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::recording::AudioPayload;

/// Coarse polarity of an analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

impl Mood {
    /// Lenient parse: case-insensitive, anything unrecognized is neutral.
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or(Mood::Neutral)
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Mood::from_label(&label))
    }
}

/// Classification returned by the analysis endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub emotion: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_emotion: Option<String>,
    /// Transcribed speech, only present for audio input
    #[serde(default, rename = "text", skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl fmt::Display for EmotionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.emotion, self.mood)
    }
}

/// One recommended track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
    /// Catalog page (last.fm) for the track
    #[serde(default, alias = "lastfm_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl Song {
    /// Where to send the user when the card is tapped
    pub fn link(&self) -> Option<&str> {
        self.spotify_url.as_deref().or(self.url.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationsResponse {
    #[serde(default)]
    pub songs: Vec<Song>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the user submitted for analysis.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Text(String),
    Audio(AudioPayload),
}

impl AnalysisInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Blank text carries nothing to analyze.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Audio(_) => false,
        }
    }
}
