//! Browser-style capture over a host-provided media API.
//!
//! The host (a webview bridge, a test harness) implements [`MediaDevices`].
//! Encoded chunks are pushed into a [`ChunkSink`] from whatever thread the
//! host delivers them on, and concatenated into one blob on stop.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info};

use super::recorder::{
    ActiveCapture, AudioPayload, CaptureBackend, CaptureLimits, RecorderError, MIME_MP4,
    MIME_WEBM,
};

/// First choice, then the one fallback
pub const PREFERRED_MIME_TYPES: [&str; 2] = [MIME_MP4, MIME_WEBM];

#[derive(Debug, thiserror::Error)]
pub enum MediaDeviceError {
    #[error("Microphone permission denied")]
    PermissionDenied,
    #[error("Media device unavailable: {0}")]
    Unavailable(String),
}

impl From<MediaDeviceError> for RecorderError {
    fn from(e: MediaDeviceError) -> Self {
        match e {
            MediaDeviceError::PermissionDenied => RecorderError::PermissionDenied,
            MediaDeviceError::Unavailable(message) => RecorderError::DeviceError(message),
        }
    }
}

/// The runtime's media-recording capability.
pub trait MediaDevices: Send + Sync {
    /// Whether the runtime can encode to `mime_type`
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Ask for the microphone and start a recorder that pushes encoded chunks
    /// into `sink`.
    fn open(
        &self,
        mime_type: &str,
        sink: ChunkSink,
    ) -> Result<Box<dyn MediaStream>, MediaDeviceError>;
}

/// A running host recorder. `stop` must release the microphone tracks.
pub trait MediaStream {
    fn stop(&mut self);
}

/// Pick the first MIME type the runtime accepts.
pub fn choose_mime_type(devices: &dyn MediaDevices) -> Option<&'static str> {
    PREFERRED_MIME_TYPES
        .into_iter()
        .find(|mime| devices.is_type_supported(mime))
}

#[derive(Debug)]
struct ChunkBuffer {
    data: Vec<u8>,
    limits: CaptureLimits,
    started: Instant,
    truncated: bool,
    closed: bool,
}

/// Cloneable handle the host pushes encoded chunks into.
#[derive(Debug, Clone)]
pub struct ChunkSink {
    inner: Arc<Mutex<ChunkBuffer>>,
}

impl ChunkSink {
    pub fn new(limits: CaptureLimits) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChunkBuffer {
                data: Vec::new(),
                limits,
                started: Instant::now(),
                truncated: false,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChunkBuffer> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append one encoded chunk. Empty chunks and chunks after stop are ignored.
    pub fn push(&self, chunk: &[u8]) {
        let mut buffer = self.lock();
        if chunk.is_empty() || buffer.closed {
            return;
        }

        if let Some(max_duration) = buffer.limits.max_duration {
            if buffer.started.elapsed() >= max_duration {
                buffer.truncated = true;
                return;
            }
        }

        let allowed = match buffer.limits.max_bytes {
            Some(max_bytes) => {
                let remaining = max_bytes.saturating_sub(buffer.data.len() as u64) as usize;
                if remaining < chunk.len() {
                    buffer.truncated = true;
                }
                remaining.min(chunk.len())
            }
            None => chunk.len(),
        };
        buffer.data.extend_from_slice(&chunk[..allowed]);
    }

    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting chunks and take everything collected so far.
    fn close(&self) -> (Vec<u8>, bool, Duration) {
        let mut buffer = self.lock();
        buffer.closed = true;
        (
            std::mem::take(&mut buffer.data),
            buffer.truncated,
            buffer.started.elapsed(),
        )
    }
}

/// Capture backend for browser runtimes.
pub struct MediaRecorderBackend {
    devices: Arc<dyn MediaDevices>,
}

impl MediaRecorderBackend {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self { devices }
    }
}

impl CaptureBackend for MediaRecorderBackend {
    fn name(&self) -> &'static str {
        "media-recorder"
    }

    fn begin(&mut self, limits: CaptureLimits) -> Result<Box<dyn ActiveCapture>, RecorderError> {
        let mime_type =
            choose_mime_type(self.devices.as_ref()).ok_or(RecorderError::UnsupportedFormat)?;

        let sink = ChunkSink::new(limits);
        let stream = self.devices.open(mime_type, sink.clone())?;
        info!("Media capture started ({})", mime_type);

        Ok(Box::new(MediaCapture {
            stream,
            sink,
            mime_type,
        }))
    }
}

struct MediaCapture {
    stream: Box<dyn MediaStream>,
    sink: ChunkSink,
    mime_type: &'static str,
}

impl ActiveCapture for MediaCapture {
    fn finish(mut self: Box<Self>) -> Result<AudioPayload, RecorderError> {
        self.stream.stop();
        let (bytes, truncated, duration) = self.sink.close();
        info!(
            "Media capture stopped: {} bytes in {}ms",
            bytes.len(),
            duration.as_millis()
        );

        let mut payload = AudioPayload::from_bytes(bytes, self.mime_type);
        payload.duration = duration;
        payload.truncated = truncated;
        Ok(payload)
    }

    fn abort(mut self: Box<Self>) {
        self.stream.stop();
        let (bytes, _, _) = self.sink.close();
        debug!("Media capture aborted, discarded {} bytes", bytes.len());
    }
}
