//! Terminal-backed speech engines
//!
//! Used by the `link-voice run` command to drive the controller without
//! audio hardware: typed lines stand in for recognized speech and
//! announcements are printed instead of played.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{
    RecognitionEngine, RecognitionErrorKind, RecognitionSettings, RecognitionSink,
    SynthesisEngine, SynthesisSink, Utterance,
};
use crate::{Error, Result};

/// Approximate speaking time per word at rate 1.0
const MS_PER_WORD: f32 = 320.0;

/// Recognition engine fed from the terminal through a [`ConsoleMic`]
#[derive(Debug)]
pub struct ConsoleRecognizer {
    active: Arc<Mutex<Option<RecognitionSink>>>,
}

/// Feeds typed text into a [`ConsoleRecognizer`]
#[derive(Debug, Clone)]
pub struct ConsoleMic {
    active: Arc<Mutex<Option<RecognitionSink>>>,
}

impl ConsoleRecognizer {
    /// Create a recognizer and the microphone handle that feeds it
    #[must_use]
    pub fn new() -> (Self, ConsoleMic) {
        let active = Arc::new(Mutex::new(None));
        (
            Self {
                active: Arc::clone(&active),
            },
            ConsoleMic { active },
        )
    }
}

impl RecognitionEngine for ConsoleRecognizer {
    fn start(&mut self, settings: &RecognitionSettings, sink: RecognitionSink) -> Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::Recognition("console recognizer lock poisoned".to_string()))?;

        if active.is_some() {
            return Err(Error::Recognition("recognition already started".to_string()));
        }

        tracing::debug!(
            session = sink.session().0,
            language = %settings.language,
            "console recognizer listening"
        );
        sink.started();
        *active = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::Recognition("console recognizer lock poisoned".to_string()))?;

        if let Some(sink) = active.take() {
            sink.ended();
        }
        Ok(())
    }
}

impl ConsoleMic {
    /// Deliver a transcript; returns false if the recognizer is not listening
    #[must_use]
    pub fn hear(&self, transcript: &str) -> bool {
        self.with_sink(|sink| sink.result(transcript, None))
    }

    /// Simulate an engine error
    #[must_use]
    pub fn fail(&self, kind: RecognitionErrorKind) -> bool {
        self.with_sink(|sink| sink.error(kind))
    }

    /// Simulate the engine ending the session on its own
    #[must_use]
    pub fn drop_session(&self) -> bool {
        let Ok(mut active) = self.active.lock() else {
            return false;
        };
        active.take().is_some_and(|sink| {
            sink.ended();
            true
        })
    }

    /// Whether the recognizer is currently listening
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.active.lock().is_ok_and(|a| a.is_some())
    }

    fn with_sink(&self, f: impl FnOnce(&RecognitionSink)) -> bool {
        let Ok(active) = self.active.lock() else {
            return false;
        };
        active.as_ref().is_some_and(|sink| {
            f(sink);
            true
        })
    }
}

/// Synthesis engine that prints announcements to stdout
///
/// Completion is reported after an estimate of how long the text would take
/// to speak, so interruption behaves like a real engine.
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer {
    playing: Option<JoinHandle<()>>,
    speaking: Arc<AtomicBool>,
}

impl ConsoleSynthesizer {
    /// Create a console synthesizer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SynthesisEngine for ConsoleSynthesizer {
    fn speak(&mut self, utterance: Utterance, sink: SynthesisSink) -> Result<()> {
        println!("🔊 {}", utterance.text);

        let duration = speaking_time(&utterance.text, utterance.rate);
        let speaking = Arc::clone(&self.speaking);
        speaking.store(true, Ordering::SeqCst);

        self.playing = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            speaking.store(false, Ordering::SeqCst);
            sink.finished();
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.playing.take() {
            handle.abort();
        }
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// Estimate how long `text` takes to speak at `rate`
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn speaking_time(text: &str, rate: f32) -> Duration {
    let words = text.split_whitespace().count().max(1) as f32;
    let ms = words * MS_PER_WORD / rate.max(0.1);
    Duration::from_millis(ms as u64)
}
