use tokio::sync::oneshot;

use super::recorder::{AudioPayload, RecorderError};
use super::CaptureEvent;

/// Commands for the capture worker
/// Sent through a channel so the non-`Send` recorder stays on one thread
#[derive(Debug)]
pub enum CaptureCommand {
    /// Acquire the microphone and begin capturing
    Start {
        reply: oneshot::Sender<Result<(), RecorderError>>,
    },
    /// Stop capturing and hand back the payload (none when idle)
    Stop {
        reply: oneshot::Sender<Result<Option<AudioPayload>, RecorderError>>,
    },
    /// Release the microphone and discard the data
    Abort { reply: Option<oneshot::Sender<()>> },
}

impl From<&CaptureCommand> for CaptureEvent {
    fn from(command: &CaptureCommand) -> Self {
        match command {
            CaptureCommand::Start { .. } => CaptureEvent::Start,
            CaptureCommand::Stop { .. } => CaptureEvent::Stop,
            CaptureCommand::Abort { .. } => CaptureEvent::Abort,
        }
    }
}
