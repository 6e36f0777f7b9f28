//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use link_voice::{
    Config, Error, MemoryPreferenceStore, PageHost, RecognitionEngine, RecognitionErrorKind,
    RecognitionSettings, RecognitionSink, Result, SynthesisEngine, SynthesisSink, Utterance,
    VoiceController,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().expect("fake state poisoned")
}

#[derive(Debug, Default)]
struct RecognizerState {
    active: Option<RecognitionSink>,
    last_sink: Option<RecognitionSink>,
    starts: usize,
    stops: usize,
    failed_starts: usize,
    overlapping_starts: usize,
    fail_starts: bool,
    last_settings: Option<RecognitionSettings>,
}

/// Recognition engine driven by the test
#[derive(Debug, Clone, Default)]
pub struct FakeRecognizer(Arc<Mutex<RecognizerState>>);

impl FakeRecognizer {
    /// Deliver a final transcript to the active session
    pub fn say(&self, transcript: &str, confidence: Option<f32>) -> bool {
        let state = lock(&self.0);
        state.active.as_ref().is_some_and(|sink| {
            sink.result(transcript, confidence);
            true
        })
    }

    /// Report an engine error on the active session
    pub fn error(&self, kind: RecognitionErrorKind) -> bool {
        let state = lock(&self.0);
        state.active.as_ref().is_some_and(|sink| {
            sink.error(kind);
            true
        })
    }

    /// End the active session as if the engine timed out on its own
    pub fn end(&self) -> bool {
        let mut state = lock(&self.0);
        state.active.take().is_some_and(|sink| {
            sink.ended();
            true
        })
    }

    /// Make subsequent starts fail
    pub fn fail_starts(&self, fail: bool) {
        lock(&self.0).fail_starts = fail;
    }

    /// Sink handed to the most recent successful start
    pub fn last_sink(&self) -> Option<RecognitionSink> {
        lock(&self.0).last_sink.clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.0).active.is_some()
    }

    pub fn starts(&self) -> usize {
        lock(&self.0).starts
    }

    pub fn stops(&self) -> usize {
        lock(&self.0).stops
    }

    pub fn failed_starts(&self) -> usize {
        lock(&self.0).failed_starts
    }

    /// Starts made while a session was still active
    pub fn overlapping_starts(&self) -> usize {
        lock(&self.0).overlapping_starts
    }

    pub fn last_settings(&self) -> Option<RecognitionSettings> {
        lock(&self.0).last_settings.clone()
    }
}

impl RecognitionEngine for FakeRecognizer {
    fn start(&mut self, settings: &RecognitionSettings, sink: RecognitionSink) -> Result<()> {
        let mut state = lock(&self.0);
        if state.fail_starts {
            state.failed_starts += 1;
            return Err(Error::Recognition("microphone busy".to_string()));
        }
        if state.active.is_some() {
            state.overlapping_starts += 1;
        }
        state.starts += 1;
        state.last_settings = Some(settings.clone());
        sink.started();
        state.last_sink = Some(sink.clone());
        state.active = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = lock(&self.0);
        state.stops += 1;
        if let Some(sink) = state.active.take() {
            sink.ended();
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SynthesizerState {
    spoken: Vec<Utterance>,
    playing: Option<SynthesisSink>,
    cancels: usize,
}

/// Synthesis engine that records utterances and finishes on demand
#[derive(Debug, Clone, Default)]
pub struct FakeSynthesizer(Arc<Mutex<SynthesizerState>>);

impl FakeSynthesizer {
    /// Every text submitted so far
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.0).spoken.iter().map(|u| u.text.clone()).collect()
    }

    /// Most recent text submitted
    pub fn last(&self) -> Option<String> {
        lock(&self.0).spoken.last().map(|u| u.text.clone())
    }

    /// Most recent utterance submitted
    pub fn last_utterance(&self) -> Option<Utterance> {
        lock(&self.0).spoken.last().cloned()
    }

    /// Number of texts submitted
    pub fn count(&self) -> usize {
        lock(&self.0).spoken.len()
    }

    /// Texts submitted after the first `n`
    pub fn spoken_since(&self, n: usize) -> Vec<String> {
        self.spoken().into_iter().skip(n).collect()
    }

    pub fn cancels(&self) -> usize {
        lock(&self.0).cancels
    }

    /// Finish the utterance currently playing
    pub fn finish(&self) -> bool {
        let mut state = lock(&self.0);
        state.playing.take().is_some_and(|sink| {
            sink.finished();
            true
        })
    }

    /// Fail the utterance currently playing
    pub fn fail(&self, reason: &str) -> bool {
        let mut state = lock(&self.0);
        state.playing.take().is_some_and(|sink| {
            sink.failed(reason);
            true
        })
    }
}

impl SynthesisEngine for FakeSynthesizer {
    fn speak(&mut self, utterance: Utterance, sink: SynthesisSink) -> Result<()> {
        let mut state = lock(&self.0);
        state.spoken.push(utterance);
        state.playing = Some(sink);
        Ok(())
    }

    fn cancel(&mut self) {
        let mut state = lock(&self.0);
        state.cancels += 1;
        if let Some(sink) = state.playing.take() {
            sink.failed("interrupted");
        }
    }

    fn is_speaking(&self) -> bool {
        lock(&self.0).playing.is_some()
    }
}

#[derive(Debug)]
struct HostState {
    history: Vec<String>,
    forward: Vec<String>,
    actions: Vec<String>,
}

/// Page host that records every action
#[derive(Debug, Clone)]
pub struct FakePageHost(Arc<Mutex<HostState>>);

impl FakePageHost {
    pub fn new(route: &str) -> Self {
        Self(Arc::new(Mutex::new(HostState {
            history: vec![route.to_string()],
            forward: Vec::new(),
            actions: Vec::new(),
        })))
    }

    /// Actions performed, e.g. `navigate /chat` or `scroll 300`
    pub fn actions(&self) -> Vec<String> {
        lock(&self.0).actions.clone()
    }
}

impl PageHost for FakePageHost {
    fn navigate(&mut self, route: &str) {
        let mut state = lock(&self.0);
        state.history.push(route.to_string());
        state.forward.clear();
        state.actions.push(format!("navigate {route}"));
    }

    fn history_back(&mut self) {
        let mut state = lock(&self.0);
        if state.history.len() > 1 {
            if let Some(route) = state.history.pop() {
                state.forward.push(route);
            }
        }
        state.actions.push("back".to_string());
    }

    fn history_forward(&mut self) {
        let mut state = lock(&self.0);
        if let Some(route) = state.forward.pop() {
            state.history.push(route);
        }
        state.actions.push("forward".to_string());
    }

    fn scroll_by(&mut self, dy: i32) {
        lock(&self.0).actions.push(format!("scroll {dy}"));
    }

    fn scroll_to_top(&mut self) {
        lock(&self.0).actions.push("top".to_string());
    }

    fn scroll_to_bottom(&mut self) {
        lock(&self.0).actions.push("bottom".to_string());
    }

    fn reload(&mut self) {
        lock(&self.0).actions.push("reload".to_string());
    }

    fn current_route(&self) -> String {
        lock(&self.0)
            .history
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }
}

/// A spawned controller wired to fakes
pub struct Harness {
    pub voice: VoiceController,
    pub recognizer: FakeRecognizer,
    pub synthesizer: FakeSynthesizer,
    pub host: FakePageHost,
    pub preferences: MemoryPreferenceStore,
}

impl Harness {
    /// Spawn a controller with both engines on the home page
    pub fn spawn() -> Self {
        Self::spawn_with(MemoryPreferenceStore::new())
    }

    /// Spawn a controller with a given preference store
    pub fn spawn_with(preferences: MemoryPreferenceStore) -> Self {
        let recognizer = FakeRecognizer::default();
        let synthesizer = FakeSynthesizer::default();
        let host = FakePageHost::new("/");

        let voice = VoiceController::builder(Config::default())
            .recognition(recognizer.clone())
            .synthesis(synthesizer.clone())
            .page_host(host.clone())
            .preferences(preferences.clone())
            .spawn();

        Self {
            voice,
            recognizer,
            synthesizer,
            host,
            preferences,
        }
    }

    /// Wait for the controller to handle everything posted so far
    pub async fn settle(&self) {
        self.voice.settle().await.expect("controller stopped");
    }

    /// Advance virtual time by `ms` and let the controller catch up
    pub async fn advance(&self, ms: u64) {
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        self.settle().await;
    }

    /// Turn global voice on and wait for the session to start
    pub async fn listen(&self) {
        self.voice.toggle_global_voice(true).unwrap();
        self.settle().await;
    }

    /// Speak to the active session and wait for the controller to react
    pub async fn say(&self, transcript: &str) {
        assert!(self.recognizer.say(transcript, Some(0.9)), "not listening");
        self.settle().await;
    }
}
