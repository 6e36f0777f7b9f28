//! Recognition session state machine
//!
//! Continuous recognition engines time out, drop sessions on silence, and
//! fail on permission problems. The session manager keeps one session alive
//! across all of that with scheduled listening breaks and classified restarts.
//!
//! The manager is pure: it consumes [`SessionInput`]s and returns the
//! [`SessionEffect`]s the controller must carry out. It never touches an
//! engine or a timer itself, so every transition is testable on its own.
//!
//! ```text
//!            Enable                 BreakElapsed
//!   Idle ─────────────▶ Listening ───────────────▶ OnBreak
//!    ▲                   │  ▲  ▲                     │
//!    │ Disable           │  │  └─────ResumeElapsed───┘
//!    │ (any state)       │  │
//!    │          error/end│  │RestartElapsed
//!    │                   ▼  │
//!    │                 Restarting
//!    │
//!   Disabled ◀── PermissionDenied (any running state)
//! ```

use std::time::Duration;

use super::RecognitionErrorKind;
use crate::config::VoiceConfig;

/// Recognition session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No session; global voice is off
    #[default]
    Idle,
    /// Engine is listening
    Listening,
    /// Scheduled break between listening windows
    OnBreak,
    /// Waiting to restart after an error or unexpected end
    Restarting,
    /// Stopped after a permission failure; needs an explicit re-enable
    Disabled,
}

/// Timers owned by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTimer {
    /// Ends the listening window
    Break,
    /// Ends the listening break
    Resume,
    /// Restarts after an error or unexpected end
    Restart,
}

/// Something that happened to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Global voice was enabled
    Enable,
    /// Global voice was disabled or the controller is shutting down
    Disable,
    /// Break timer fired
    BreakElapsed,
    /// Resume timer fired
    ResumeElapsed,
    /// Restart timer fired
    RestartElapsed,
    /// Engine reported an error
    EngineError(RecognitionErrorKind),
    /// Engine stopped on its own
    EngineEnded,
    /// Engine refused to start
    StartFailed,
}

/// Work the controller must carry out after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Start a new engine session
    StartEngine,
    /// Stop the engine session if one is active
    StopEngine,
    /// Schedule a session timer, replacing one of the same kind
    Schedule(SessionTimer, Duration),
    /// Cancel every session timer
    CancelTimers,
    /// Clear the processing flag
    ClearProcessing,
    /// Turn global voice off
    DisableVoice,
    /// Tell the user microphone access was refused
    AnnouncePermissionDenied,
}

/// Delays used by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Listening window before a break
    pub listen_window: Duration,
    /// Break length
    pub break_duration: Duration,
    /// Restart delay after `no-speech`
    pub no_speech_retry: Duration,
    /// Restart delay after other errors
    pub error_retry: Duration,
    /// Restart delay after an unexpected end
    pub end_restart: Duration,
    /// Retry delay after a failed start
    pub start_retry: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

impl From<&VoiceConfig> for SessionTimings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            listen_window: config.listen_window,
            break_duration: config.break_duration,
            no_speech_retry: config.no_speech_retry,
            error_retry: config.error_retry,
            end_restart: config.end_restart,
            start_retry: config.start_retry,
        }
    }
}

/// Recognition session state machine
#[derive(Debug, Clone)]
pub struct SessionManager {
    state: SessionState,
    timings: SessionTimings,
}

impl SessionManager {
    /// Create an idle session manager
    #[must_use]
    pub const fn new(timings: SessionTimings) -> Self {
        Self {
            state: SessionState::Idle,
            timings,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Apply an input and return the effects to carry out
    pub fn handle(&mut self, input: SessionInput) -> Vec<SessionEffect> {
        let from = self.state;
        let (to, effects) = self.transition(&input);
        if from != to {
            tracing::debug!(?from, ?to, ?input, "session transition");
        } else if effects.is_empty() {
            tracing::trace!(state = ?from, ?input, "session input ignored");
        }
        self.state = to;
        effects
    }

    fn transition(&self, input: &SessionInput) -> (SessionState, Vec<SessionEffect>) {
        use SessionEffect::{
            AnnouncePermissionDenied, CancelTimers, ClearProcessing, DisableVoice, Schedule,
            StartEngine, StopEngine,
        };
        use SessionState::{Disabled, Idle, Listening, OnBreak, Restarting};

        let t = &self.timings;
        let listen = || {
            (
                Listening,
                vec![
                    CancelTimers,
                    StartEngine,
                    Schedule(SessionTimer::Break, t.listen_window),
                ],
            )
        };

        match (self.state, input) {
            // Re-entrant enable is a no-op while a session is running
            (Idle | Disabled, SessionInput::Enable) => listen(),
            (_, SessionInput::Enable) => (self.state, Vec::new()),

            (_, SessionInput::Disable) => (Idle, vec![CancelTimers, StopEngine]),

            (Listening, SessionInput::BreakElapsed) => (
                OnBreak,
                vec![
                    StopEngine,
                    Schedule(SessionTimer::Resume, t.break_duration),
                ],
            ),
            (OnBreak, SessionInput::ResumeElapsed) | (Restarting, SessionInput::RestartElapsed) => {
                listen()
            }

            (
                Listening | OnBreak | Restarting,
                SessionInput::EngineError(RecognitionErrorKind::PermissionDenied),
            ) => (
                Disabled,
                vec![
                    CancelTimers,
                    StopEngine,
                    ClearProcessing,
                    DisableVoice,
                    AnnouncePermissionDenied,
                ],
            ),
            (Listening, SessionInput::EngineError(kind)) => {
                let delay = if *kind == RecognitionErrorKind::NoSpeech {
                    t.no_speech_retry
                } else {
                    t.error_retry
                };
                (
                    Restarting,
                    vec![
                        CancelTimers,
                        StopEngine,
                        ClearProcessing,
                        Schedule(SessionTimer::Restart, delay),
                    ],
                )
            }

            (Listening, SessionInput::EngineEnded) => (
                Restarting,
                vec![
                    CancelTimers,
                    ClearProcessing,
                    Schedule(SessionTimer::Restart, t.end_restart),
                ],
            ),

            (Listening, SessionInput::StartFailed) => (
                Restarting,
                vec![
                    CancelTimers,
                    Schedule(SessionTimer::Restart, t.start_retry),
                ],
            ),

            // Late timers, expected ends after a stop, and errors outside a
            // listening window change nothing
            (state, _) => (state, Vec::new()),
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionTimings::default())
    }
}
