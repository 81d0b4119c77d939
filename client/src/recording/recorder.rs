use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::error;

pub const MIME_WAV: &str = "audio/wav";
pub const MIME_MP4: &str = "audio/mp4";
pub const MIME_WEBM: &str = "audio/webm";

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No supported recording format")]
    UnsupportedFormat,

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No input device")]
    NoInputDevice,

    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("Failed to build stream: {0}")]
    BuildStreamError(#[from] cpal::BuildStreamError),

    #[error("Failed to play stream: {0}")]
    PlayStreamError(#[from] cpal::PlayStreamError),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Audio encoding error: {0}")]
    EncodingError(#[from] hound::Error),

    #[error("Capture worker is not running")]
    WorkerGone,
}

impl RecorderError {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            RecorderError::PermissionDenied => {
                "Failed to start recording. Please check permissions.".to_string()
            }
            RecorderError::UnsupportedFormat => {
                "Recording is not supported in this browser.".to_string()
            }
            RecorderError::AlreadyRecording => "A recording is already in progress.".to_string(),
            RecorderError::NoInputDevice | RecorderError::DeviceError(_) => {
                "No microphone found. Please connect one and try again.".to_string()
            }
            RecorderError::BuildStreamError(_) | RecorderError::PlayStreamError(_) => {
                "Microphone error. Check your audio settings.".to_string()
            }
            RecorderError::IoError(_) | RecorderError::EncodingError(_) => {
                "Failed to process recording.".to_string()
            }
            RecorderError::WorkerGone => "Recording is unavailable. Please restart.".to_string(),
        }
    }
}

/// Optional caps on a single capture. Data past a cap is dropped and the
/// payload is marked truncated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureLimits {
    pub max_bytes: Option<u64>,
    pub max_duration: Option<Duration>,
}

/// Where the captured audio lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioData {
    /// Encoded bytes held in memory (media-recorder path)
    Bytes(Vec<u8>),
    /// A finished file on disk (native path)
    File(PathBuf),
}

/// Encoded output of one capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub data: AudioData,
    pub mime_type: String,
    pub duration: Duration,
    /// A capture limit cut the recording short
    pub truncated: bool,
}

impl AudioPayload {
    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data: AudioData::Bytes(bytes),
            mime_type: mime_type.into(),
            duration: Duration::ZERO,
            truncated: false,
        }
    }

    pub fn from_file(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            data: AudioData::File(path.into()),
            mime_type: mime_type.into(),
            duration: Duration::ZERO,
            truncated: false,
        }
    }

    /// File name sent with the multipart upload
    pub fn upload_file_name(&self) -> &'static str {
        match (&self.data, self.mime_type.as_str()) {
            (AudioData::File(_), _) => "recording.wav",
            (AudioData::Bytes(_), MIME_MP4) => "recording.mp4",
            (AudioData::Bytes(_), MIME_WAV) => "recording.wav",
            (AudioData::Bytes(_), _) => "recording.webm",
        }
    }

    pub fn size_bytes(&self) -> io::Result<u64> {
        match &self.data {
            AudioData::Bytes(bytes) => Ok(bytes.len() as u64),
            AudioData::File(path) => Ok(fs::metadata(path)?.len()),
        }
    }

    pub async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        match &self.data {
            AudioData::Bytes(bytes) => Ok(bytes.clone()),
            AudioData::File(path) => tokio::fs::read(path).await,
        }
    }

    /// Remove the backing file, if any. Best-effort.
    pub fn cleanup(&self) {
        if let AudioData::File(path) = &self.data {
            cleanup_recording_file(path);
        }
    }
}

/// A way of opening the microphone. Lives on the capture worker thread.
pub trait CaptureBackend: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Acquire the microphone and start capturing.
    fn begin(&mut self, limits: CaptureLimits) -> Result<Box<dyn ActiveCapture>, RecorderError>;
}

/// A live capture. Owns the microphone until `finish` or `abort`; dropping
/// it also releases the device.
pub trait ActiveCapture {
    /// Release the microphone and flush everything captured into one payload.
    fn finish(self: Box<Self>) -> Result<AudioPayload, RecorderError>;

    /// Release the microphone and discard the data.
    fn abort(self: Box<Self>);
}

/// Clean up a recording file
/// Logs errors but doesn't fail - cleanup is best-effort
pub fn cleanup_recording_file(file_path: &Path) {
    if let Err(e) = fs::remove_file(file_path) {
        if e.kind() != io::ErrorKind::NotFound {
            error!("Failed to cleanup recording file {:?}: {}", file_path, e);
        }
    }
}
