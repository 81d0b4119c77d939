mod commands;
mod controller;
mod media_recorder;
mod native_recorder;
mod permission;
mod recorder;
mod state_manager;

// Public exports
pub use controller::{capture_backend, CaptureController};
pub use media_recorder::{
    choose_mime_type, ChunkSink, MediaDeviceError, MediaDevices, MediaRecorderBackend,
    MediaStream, PREFERRED_MIME_TYPES,
};
pub use native_recorder::{cleanup_old_recordings, NativeRecorder};
pub use permission::{MicrophoneAccess, PermissionStatus, SystemMicrophone};
pub use recorder::{
    cleanup_recording_file, ActiveCapture, AudioData, AudioPayload, CaptureBackend,
    CaptureLimits, RecorderError, MIME_MP4, MIME_WAV, MIME_WEBM,
};
pub use state_manager::{
    CaptureAction, CaptureEvent, CaptureState, CaptureStateManager, TransitionRejection,
    TransitionResult,
};
