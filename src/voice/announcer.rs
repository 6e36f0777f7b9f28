//! Spoken announcements
//!
//! Wraps the synthesis engine. There is no queue: an interrupting
//! announcement cancels whatever is playing, so the last one submitted wins.

use super::{SynthesisEngine, SynthesisSink, Utterance, UtteranceId};
use crate::config::VoiceConfig;
use crate::controller::WeakMailbox;

/// Speaks announcements through the synthesis engine
pub struct Announcer {
    engine: Option<Box<dyn SynthesisEngine>>,
    mailbox: WeakMailbox,
    rate: f32,
    volume: f32,
    language: String,
    next_id: u64,
    in_flight: Option<UtteranceId>,
    last_spoken: Option<String>,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("available", &self.engine.is_some())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Announcer {
    pub(crate) fn new(
        engine: Option<Box<dyn SynthesisEngine>>,
        config: &VoiceConfig,
        mailbox: WeakMailbox,
    ) -> Self {
        Self {
            engine,
            mailbox,
            rate: config.speech_rate,
            volume: config.speech_volume,
            language: config.language.clone(),
            next_id: 0,
            in_flight: None,
            last_spoken: None,
        }
    }

    /// Whether a synthesis engine is available
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    /// Speak `text`, cancelling current speech first when `interrupt` is set
    ///
    /// Returns the submitted utterance, or `None` if nothing was submitted.
    pub fn speak(&mut self, text: &str, interrupt: bool) -> Option<UtteranceId> {
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!(text, "no synthesis engine, announcement dropped");
            return None;
        };

        if interrupt && engine.is_speaking() {
            tracing::trace!("interrupting current announcement");
            engine.cancel();
        }

        self.next_id += 1;
        let id = UtteranceId(self.next_id);
        let utterance = Utterance {
            id,
            text: text.to_string(),
            rate: self.rate,
            volume: self.volume,
            language: self.language.clone(),
        };

        tracing::debug!(utterance = id.0, text, interrupt, "speaking");
        self.last_spoken = Some(text.to_string());

        match engine.speak(utterance, SynthesisSink::new(id, self.mailbox.clone())) {
            Ok(()) => {
                self.in_flight = Some(id);
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to submit announcement");
                None
            }
        }
    }

    /// Record that an utterance finished or failed
    ///
    /// Returns true if it was the current in-flight utterance.
    pub fn complete(&mut self, id: UtteranceId) -> bool {
        if self.in_flight == Some(id) {
            self.in_flight = None;
            true
        } else {
            tracing::trace!(utterance = id.0, "superseded utterance completed");
            false
        }
    }

    /// Whether an announcement is waiting for completion
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Text of the most recent announcement
    #[must_use]
    pub fn last_spoken(&self) -> Option<&str> {
        self.last_spoken.as_deref()
    }

    /// Cancel current speech and forget the in-flight utterance
    pub fn silence(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
        self.in_flight = None;
    }
}
