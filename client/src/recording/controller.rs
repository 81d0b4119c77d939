use std::sync::Arc;
use std::thread;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;

use crate::config::ClientConfig;
use crate::recording::{
    commands::CaptureCommand,
    media_recorder::{MediaDevices, MediaRecorderBackend},
    native_recorder::NativeRecorder,
    permission::SystemMicrophone,
    ActiveCapture, AudioPayload, CaptureAction, CaptureBackend, CaptureEvent, CaptureLimits,
    CaptureState, CaptureStateManager, RecorderError, TransitionResult,
};

const COMMAND_BUFFER: usize = 16;

/// Pick the capture backend for this runtime. A host that provides a media
/// API gets the media recorder; everything else records natively.
pub fn capture_backend(
    config: &ClientConfig,
    media: Option<Arc<dyn MediaDevices>>,
) -> Box<dyn CaptureBackend> {
    match media {
        Some(devices) => Box::new(MediaRecorderBackend::new(devices)),
        None => Box::new(NativeRecorder::new(
            config.recordings_dir.clone(),
            Box::new(SystemMicrophone),
        )),
    }
}

/// Async handle to the capture worker.
///
/// The worker thread is the sole owner of the microphone. Dropping the
/// handle aborts any live capture and lets the worker exit.
pub struct CaptureController {
    command_tx: Sender<CaptureCommand>,
    state_manager: Arc<CaptureStateManager>,
}

impl CaptureController {
    pub fn spawn(
        backend: Box<dyn CaptureBackend>,
        limits: CaptureLimits,
    ) -> Result<Self, RecorderError> {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let state_manager = Arc::new(CaptureStateManager::new());

        let worker = Worker::new(command_rx, backend, limits, state_manager.clone());
        thread::Builder::new()
            .name("riff-capture".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            command_tx,
            state_manager,
        })
    }

    pub fn state(&self) -> CaptureState {
        self.state_manager.current()
    }

    pub fn is_capturing(&self) -> bool {
        self.state_manager.is_capturing()
    }

    /// Start capturing. Fails with `AlreadyRecording` if a capture is live;
    /// the live capture is left alone.
    pub async fn start(&self) -> Result<(), RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::Start { reply }).await?;
        rx.await.map_err(|_| RecorderError::WorkerGone)?
    }

    /// Stop capturing and return the payload. Returns `Ok(None)` when idle.
    pub async fn stop(&self) -> Result<Option<AudioPayload>, RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::Stop { reply }).await?;
        rx.await.map_err(|_| RecorderError::WorkerGone)?
    }

    /// Drop the live capture, if any, and release the microphone.
    pub async fn cancel(&self) -> Result<(), RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.send(CaptureCommand::Abort { reply: Some(reply) })
            .await?;
        rx.await.map_err(|_| RecorderError::WorkerGone)
    }

    async fn send(&self, command: CaptureCommand) -> Result<(), RecorderError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RecorderError::WorkerGone)
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if self.state_manager.current().is_busy() {
            debug!("Capture controller dropped while busy, aborting");
        }
        // The worker also aborts when the channel closes; this covers a full buffer.
        let _ = self
            .command_tx
            .try_send(CaptureCommand::Abort { reply: None });
    }
}

struct Worker {
    command_rx: Receiver<CaptureCommand>,
    backend: Box<dyn CaptureBackend>,
    limits: CaptureLimits,
    state_manager: Arc<CaptureStateManager>,
}

impl Worker {
    fn new(
        command_rx: Receiver<CaptureCommand>,
        backend: Box<dyn CaptureBackend>,
        limits: CaptureLimits,
        state_manager: Arc<CaptureStateManager>,
    ) -> Self {
        // Ensure we start in Idle state
        state_manager.reset();

        Self {
            command_rx,
            backend,
            limits,
            state_manager,
        }
    }

    /// Main control loop - consumes self, runs on the capture thread
    fn run(mut self) {
        // Active capture lives here (not Send, so stays in this thread)
        let mut active: Option<Box<dyn ActiveCapture>> = None;

        info!("Capture worker started ({})", self.backend.name());

        while let Some(command) = self.command_rx.blocking_recv() {
            self.handle(command, &mut active);
        }

        // Every sender is gone: release the microphone on the way out
        if let Some(capture) = active.take() {
            warn!("Capture worker closing with a live capture, aborting");
            capture.abort();
        }
        self.state_manager.reset();
        debug!("Capture worker stopped");
    }

    fn handle(&mut self, command: CaptureCommand, active: &mut Option<Box<dyn ActiveCapture>>) {
        let transition = self.state_manager.transition(CaptureEvent::from(&command));
        let action = match transition {
            Ok(TransitionResult::Changed { action, .. }) => Ok(action),
            Ok(TransitionResult::Unchanged) => Ok(None),
            Err(rejection) => {
                warn!("{}", rejection);
                Err(rejection)
            }
        };

        match command {
            CaptureCommand::Start { reply } => {
                let result = match action {
                    Ok(Some(CaptureAction::BeginCapture)) => self.begin(active),
                    Ok(_) => Ok(()),
                    Err(_) => Err(RecorderError::AlreadyRecording),
                };
                let _ = reply.send(result);
            }
            CaptureCommand::Stop { reply } => {
                let result = match action {
                    Ok(Some(CaptureAction::FinishCapture)) => self.finish(active).map(Some),
                    _ => Ok(None),
                };
                let _ = reply.send(result);
            }
            CaptureCommand::Abort { reply } => {
                if let Ok(Some(CaptureAction::AbortCapture)) = action {
                    if let Some(capture) = active.take() {
                        capture.abort();
                    }
                }
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
        }
    }

    fn begin(&mut self, active: &mut Option<Box<dyn ActiveCapture>>) -> Result<(), RecorderError> {
        match self.backend.begin(self.limits) {
            Ok(capture) => {
                *active = Some(capture);
                Ok(())
            }
            Err(e) => {
                error!("Error starting capture: {}", e);
                // Reset state on error
                self.state_manager.reset();
                Err(e)
            }
        }
    }

    fn finish(
        &mut self,
        active: &mut Option<Box<dyn ActiveCapture>>,
    ) -> Result<AudioPayload, RecorderError> {
        let result = match active.take() {
            Some(capture) => capture.finish(),
            None => Err(RecorderError::DeviceError(
                "no active capture to finish".to_string(),
            )),
        };

        if let Err(e) = self.state_manager.transition(CaptureEvent::Finalized) {
            warn!("Finalized transition failed: {}", e);
            self.state_manager.reset();
        }

        if let Err(e) = &result {
            error!("Error stopping capture: {}", e);
        }
        result
    }
}
