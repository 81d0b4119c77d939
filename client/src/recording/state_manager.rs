//! Capture State Machine - Single source of truth for valid state transitions
//!
//! State diagram:
//! ```text
//! Idle ──Start──> Capturing ──Stop──> Finalizing ──Finalized──> Idle
//!                     │
//!                  [Abort]──> Idle
//! ```
//!
//! `Stop` and `Abort` while idle are accepted and change nothing. `Start`
//! outside of `Idle` is rejected: only one capture may be live at a time.

use std::sync::{Mutex, MutexGuard};

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CaptureEvent {
    /// Open the microphone and begin capturing
    Start,
    /// Stop capturing and produce a payload
    Stop,
    /// The payload has been flushed
    Finalized,
    /// Drop the capture without producing a payload
    Abort,
}

/// Actions the worker should perform after a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    BeginCapture,
    FinishCapture,
    AbortCapture,
}

/// Capture states
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CaptureState {
    /// No microphone is held
    Idle,
    /// Audio is being captured
    Capturing,
    /// Capture stopped, payload is being flushed
    Finalizing,
}

impl CaptureState {
    /// The microphone is held in every state except `Idle`
    pub fn is_busy(self) -> bool {
        self != Self::Idle
    }
}

/// Result of a successful state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// State changed
    Changed {
        from: CaptureState,
        to: CaptureState,
        action: Option<CaptureAction>,
    },
    /// Event was valid but state didn't change
    Unchanged,
}

/// Reason a transition was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{attempted_event} event rejected in {current_state} state")]
pub struct TransitionRejection {
    pub current_state: CaptureState,
    pub attempted_event: CaptureEvent,
}

/// Thread-safe capture state manager
#[derive(Debug)]
pub struct CaptureStateManager {
    state: Mutex<CaptureState>,
}

impl CaptureStateManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CaptureState::Idle),
        }
    }

    // The guarded value is a Copy enum, so a poisoned lock still holds a valid state.
    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the current state (read-only, thread-safe)
    pub fn current(&self) -> CaptureState {
        *self.lock()
    }

    pub fn is_capturing(&self) -> bool {
        self.current() == CaptureState::Capturing
    }

    /// Attempt a state transition based on an event
    ///
    /// This is the ONLY way to change state - ensures all transitions are valid.
    pub fn transition(&self, event: CaptureEvent) -> Result<TransitionResult, TransitionRejection> {
        let mut state = self.lock();
        let current = *state;

        match compute_transition(current, event) {
            Some((new_state, action)) => {
                if new_state == current {
                    return Ok(TransitionResult::Unchanged);
                }

                *state = new_state;
                Ok(TransitionResult::Changed {
                    from: current,
                    to: new_state,
                    action,
                })
            }
            None => Err(TransitionRejection {
                current_state: current,
                attempted_event: event,
            }),
        }
    }

    /// Reset to Idle state
    ///
    /// Used for error recovery when a capture fails to open or flush.
    pub fn reset(&self) {
        *self.lock() = CaptureState::Idle;
    }
}

impl Default for CaptureStateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure function: compute what transition should happen (if any)
/// Returns None if the transition is invalid
fn compute_transition(
    current: CaptureState,
    event: CaptureEvent,
) -> Option<(CaptureState, Option<CaptureAction>)> {
    match current {
        CaptureState::Idle => match event {
            CaptureEvent::Start => Some((CaptureState::Capturing, Some(CaptureAction::BeginCapture))),
            CaptureEvent::Stop | CaptureEvent::Abort => Some((CaptureState::Idle, None)),
            CaptureEvent::Finalized => None,
        },

        CaptureState::Capturing => match event {
            CaptureEvent::Stop => Some((
                CaptureState::Finalizing,
                Some(CaptureAction::FinishCapture),
            )),
            CaptureEvent::Abort => Some((CaptureState::Idle, Some(CaptureAction::AbortCapture))),
            CaptureEvent::Start | CaptureEvent::Finalized => None,
        },

        CaptureState::Finalizing => match event {
            CaptureEvent::Finalized => Some((CaptureState::Idle, None)),
            _ => None,
        },
    }
}
