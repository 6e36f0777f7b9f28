//! Controller mailbox

use tokio::sync::{mpsc, oneshot};

use super::timers::TimerKind;
use crate::commands::CommandEntry;
use crate::voice::{RecognitionEvent, SessionId, SynthesisEvent, UtteranceId};

/// Everything the controller actor reacts to
#[derive(Debug)]
pub enum Message {
    /// Register a page command
    AddCommand(CommandEntry),
    /// Unregister a page command
    RemoveCommand {
        /// Phrase as registered
        phrase: String,
    },
    /// Turn blind accessibility mode on or off
    ToggleBlindMode(bool),
    /// Turn global voice on or off
    ToggleGlobalVoice(bool),
    /// Speak text on behalf of a page
    Speak {
        /// Text to speak
        text: String,
        /// Cancel current speech first
        interrupt: bool,
    },
    /// Announce arrival on a named page
    AnnouncePageChange(String),
    /// The host navigated to a new route
    RouteChanged(String),
    /// Report from the recognition engine
    Recognition {
        /// Session the report belongs to
        session: SessionId,
        /// What happened
        event: RecognitionEvent,
    },
    /// Report from the synthesis engine
    Synthesis {
        /// Utterance the report belongs to
        utterance: UtteranceId,
        /// What happened
        event: SynthesisEvent,
    },
    /// A scheduled timer elapsed
    TimerFired {
        /// Which timer
        timer: TimerKind,
        /// Generation it was scheduled with
        generation: u64,
    },
    /// Reply once every earlier message has been handled
    Settle(oneshot::Sender<()>),
    /// Tear down and reply when done
    Shutdown(oneshot::Sender<()>),
}

/// Sending half of the controller mailbox
///
/// Only [`VoiceController`](super::VoiceController) handles hold one; the
/// actor stops once the last handle is gone.
#[derive(Debug, Clone)]
pub struct Mailbox(mpsc::UnboundedSender<Message>);

impl Mailbox {
    pub(crate) const fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self(tx)
    }

    /// Post a message; returns false once the controller has stopped
    pub(crate) fn send(&self, message: Message) -> bool {
        self.0.send(message).is_ok()
    }

    /// Sender for the actor's own timers and engine sinks
    pub(crate) fn downgrade(&self) -> WeakMailbox {
        WeakMailbox(self.0.downgrade())
    }
}

/// Mailbox sender that does not keep the controller alive
#[derive(Debug, Clone)]
pub struct WeakMailbox(mpsc::WeakUnboundedSender<Message>);

impl WeakMailbox {
    /// Post a message; returns false once every handle has been dropped
    pub(crate) fn send(&self, message: Message) -> bool {
        self.0.upgrade().is_some_and(|tx| tx.send(message).is_ok())
    }
}
