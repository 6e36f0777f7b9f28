//! Speech platform collaborators
//!
//! The recognition and synthesis engines are external to the controller.
//! Engines report back through the sink they are handed when work starts;
//! sinks are tagged so reports from a superseded session or utterance are
//! dropped by the controller.

mod announcer;
pub mod console;
mod session;

pub use announcer::Announcer;
pub use session::{
    SessionEffect, SessionInput, SessionManager, SessionState, SessionTimer, SessionTimings,
};

use std::fmt;

use crate::Result;
use crate::controller::{Message, WeakMailbox};

/// Identifies one start/stop cycle of the recognition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// Identifies one submitted announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

/// How the recognition engine should listen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    /// Keep listening across utterances until stopped
    pub continuous: bool,

    /// Report partial hypotheses
    pub interim_results: bool,

    /// Recognition language (e.g. "en-US")
    pub language: String,

    /// Alternatives per result
    pub max_alternatives: u32,
}

impl RecognitionSettings {
    /// Continuous, final-results-only settings for a language
    #[must_use]
    pub fn continuous(language: &str) -> Self {
        Self {
            continuous: true,
            interim_results: false,
            language: language.to_string(),
            max_alternatives: 1,
        }
    }
}

/// Error reported by the recognition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// Microphone or recognition service access was refused
    PermissionDenied,
    /// Nothing was said before the engine gave up
    NoSpeech,
    /// The session was aborted by the platform
    Aborted,
    /// Audio capture failed
    AudioCapture,
    /// Network failure in a cloud-backed engine
    Network,
    /// Any other engine error code
    Other(String),
}

impl RecognitionErrorKind {
    /// Classify a platform error code (e.g. `no-speech`, `not-allowed`)
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "not-allowed" | "service-not-allowed" => Self::PermissionDenied,
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "not-allowed"),
            Self::NoSpeech => write!(f, "no-speech"),
            Self::Aborted => write!(f, "aborted"),
            Self::AudioCapture => write!(f, "audio-capture"),
            Self::Network => write!(f, "network"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Event raised by the recognition engine
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Engine began listening
    Started,
    /// Final transcript with optional confidence
    Result {
        /// Recognized text
        transcript: String,
        /// Engine confidence, if reported
        confidence: Option<f32>,
    },
    /// Engine error
    Error(RecognitionErrorKind),
    /// Engine stopped
    Ended,
}

/// Event raised by the synthesis engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// Utterance finished playing
    Finished,
    /// Utterance failed or was cancelled
    Failed(String),
}

/// Where a recognition engine reports events for one session
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    session: SessionId,
    mailbox: WeakMailbox,
}

impl RecognitionSink {
    pub(crate) const fn new(session: SessionId, mailbox: WeakMailbox) -> Self {
        Self { session, mailbox }
    }

    /// Session this sink reports for
    #[must_use]
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Engine began listening
    pub fn started(&self) {
        self.emit(RecognitionEvent::Started);
    }

    /// Engine produced a final transcript
    pub fn result(&self, transcript: impl Into<String>, confidence: Option<f32>) {
        self.emit(RecognitionEvent::Result {
            transcript: transcript.into(),
            confidence,
        });
    }

    /// Engine failed
    pub fn error(&self, kind: RecognitionErrorKind) {
        self.emit(RecognitionEvent::Error(kind));
    }

    /// Engine stopped
    pub fn ended(&self) {
        self.emit(RecognitionEvent::Ended);
    }

    fn emit(&self, event: RecognitionEvent) {
        if !self.mailbox.send(Message::Recognition {
            session: self.session,
            event,
        }) {
            tracing::trace!(
                session = self.session.0,
                "controller gone, dropping recognition event"
            );
        }
    }
}

/// Where a synthesis engine reports completion of one utterance
#[derive(Debug, Clone)]
pub struct SynthesisSink {
    utterance: UtteranceId,
    mailbox: WeakMailbox,
}

impl SynthesisSink {
    pub(crate) const fn new(utterance: UtteranceId, mailbox: WeakMailbox) -> Self {
        Self { utterance, mailbox }
    }

    /// Utterance this sink reports for
    #[must_use]
    pub const fn utterance(&self) -> UtteranceId {
        self.utterance
    }

    /// Utterance finished playing
    pub fn finished(&self) {
        self.emit(SynthesisEvent::Finished);
    }

    /// Utterance failed or was interrupted
    pub fn failed(&self, reason: impl Into<String>) {
        self.emit(SynthesisEvent::Failed(reason.into()));
    }

    fn emit(&self, event: SynthesisEvent) {
        if !self.mailbox.send(Message::Synthesis {
            utterance: self.utterance,
            event,
        }) {
            tracing::trace!(
                utterance = self.utterance.0,
                "controller gone, dropping synthesis event"
            );
        }
    }
}

/// Text submitted for speaking
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Identifier echoed back through the sink
    pub id: UtteranceId,
    /// Text to speak
    pub text: String,
    /// Speech rate
    pub rate: f32,
    /// Volume (0.0 to 1.0)
    pub volume: f32,
    /// Language tag
    pub language: String,
}

/// Continuous speech-recognition engine
///
/// The controller calls `start` at most once per session and always calls
/// `stop` before starting again.
pub trait RecognitionEngine: Send {
    /// Begin a listening session reporting into `sink`
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot start (e.g. already running)
    fn start(&mut self, settings: &RecognitionSettings, sink: RecognitionSink) -> Result<()>;

    /// Stop the current session
    ///
    /// # Errors
    ///
    /// Returns error if the engine fails to stop
    fn stop(&mut self) -> Result<()>;
}

/// Speech-synthesis engine
pub trait SynthesisEngine: Send {
    /// Queue an utterance, reporting completion into `sink`
    ///
    /// # Errors
    ///
    /// Returns error if the utterance cannot be submitted
    fn speak(&mut self, utterance: Utterance, sink: SynthesisSink) -> Result<()>;

    /// Cancel whatever is playing or queued
    fn cancel(&mut self);

    /// Whether an utterance is currently playing
    fn is_speaking(&self) -> bool;
}
