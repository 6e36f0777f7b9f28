//! Controller actor
//!
//! Owns every piece of mutable controller state. API calls, engine reports,
//! and timer expirations arrive through one mailbox and are handled one at a
//! time, so session start and stop never interleave.

use std::ops::ControlFlow;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::{mpsc, watch};

use super::message::{Message, WeakMailbox};
use super::timers::{TimerKind, Timers};
use crate::commands::{
    BuiltinCommand, CUSTOM_COMMAND_CONFIRMATION, CommandRegistry, Dispatcher, Resolution,
    SCROLL_STEP, global_help, page_help, unrecognized_message,
};
use crate::config::VoiceConfig;
use crate::pages::{PageHost, location_announcement, navigation_announcement, page_name};
use crate::preferences::{PreferenceStore, Preferences};
use crate::status::{Capabilities, VoiceStatus};
use crate::voice::{
    Announcer, RecognitionEngine, RecognitionEvent, RecognitionSettings, RecognitionSink,
    SessionEffect, SessionId, SessionInput, SessionManager, SessionState, SessionTimer,
    SessionTimings, SynthesisEvent, UtteranceId,
};

pub const PERMISSION_DENIED: &str =
    "Microphone access denied. Please enable microphone permissions.";
pub const BLIND_MODE_ON: &str = "Blind accessibility mode activated. Global voice commands are now enabled throughout the application. Say \"help\" to hear available commands.";
pub const BLIND_MODE_OFF: &str =
    "Blind accessibility mode deactivated. Global voice commands are now disabled.";
pub const GLOBAL_VOICE_ON: &str =
    "Global voice recognition enabled. I will listen continuously across all pages.";
pub const GLOBAL_VOICE_OFF: &str = "Global voice recognition disabled.";
pub const NOTHING_TO_REPEAT: &str = "I haven't said anything yet.";
pub const COMMAND_FAILED: &str = "Sorry, that command failed.";

/// Collaborators and settings the actor starts with
pub struct Parts {
    pub voice: VoiceConfig,
    pub initial_route: String,
    pub recognizer: Option<Box<dyn RecognitionEngine>>,
    pub announcer: Announcer,
    pub host: Option<Box<dyn PageHost>>,
    pub preferences: Box<dyn PreferenceStore>,
    pub capabilities: Capabilities,
}

pub struct Actor {
    status: watch::Sender<VoiceStatus>,
    capabilities: Capabilities,
    session: SessionManager,
    settings: RecognitionSettings,
    recognizer: Option<Box<dyn RecognitionEngine>>,
    engine_session: Option<SessionId>,
    next_session: u64,
    announcer: Announcer,
    registry: CommandRegistry,
    dispatcher: Dispatcher,
    host: Option<Box<dyn PageHost>>,
    preferences: Box<dyn PreferenceStore>,
    timers: Timers,
    mailbox: WeakMailbox,
    current_route: String,
    page_announcement_delay: std::time::Duration,
    mode_summary_delay: std::time::Duration,
}

impl Actor {
    pub fn new(parts: Parts, status: watch::Sender<VoiceStatus>, mailbox: WeakMailbox) -> Self {
        let current_route = parts
            .host
            .as_ref()
            .map_or(parts.initial_route, |host| host.current_route());

        Self {
            status,
            capabilities: parts.capabilities,
            session: SessionManager::new(SessionTimings::from(&parts.voice)),
            settings: RecognitionSettings::continuous(&parts.voice.language),
            recognizer: parts.recognizer,
            engine_session: None,
            next_session: 0,
            announcer: parts.announcer,
            registry: CommandRegistry::new(),
            dispatcher: Dispatcher::new(parts.voice.confidence_threshold),
            host: parts.host,
            preferences: parts.preferences,
            timers: Timers::new(mailbox.clone()),
            mailbox,
            current_route,
            page_announcement_delay: parts.voice.page_announcement_delay,
            mode_summary_delay: parts.voice.mode_summary_delay,
        }
    }

    /// Restore the saved voice mode
    ///
    /// A saved blind mode comes back silently apart from the usual page
    /// announcement.
    pub fn restore(&mut self) {
        let prefs = match self.preferences.load() {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load voice preferences, using defaults");
                Preferences::default()
            }
        };

        if prefs.voice_mode_enabled {
            tracing::info!(route = %self.current_route, "restoring blind mode");
            self.status.send_modify(|s| {
                s.is_blind_mode = true;
                s.is_global_voice_enabled = true;
            });
            self.apply_voice_state();
            self.timers.schedule(TimerKind::PageAnnouncement, self.page_announcement_delay);
        }
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        tracing::debug!(capabilities = ?self.capabilities, "voice controller started");

        while let Some(message) = rx.recv().await {
            if self.handle(message).is_break() {
                tracing::debug!("voice controller stopped");
                return;
            }
        }

        // Every handle dropped without a shutdown
        self.teardown();
        tracing::debug!("voice controller released");
    }

    fn handle(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::AddCommand(entry) => {
                tracing::debug!(phrase = %entry.phrase, "page command registered");
                self.registry.register(entry);
            }
            Message::RemoveCommand { phrase } => {
                if self.registry.unregister(&phrase).is_some() {
                    tracing::debug!(phrase = %phrase, "page command removed");
                }
            }
            Message::ToggleBlindMode(enabled) => self.set_blind_mode(enabled),
            Message::ToggleGlobalVoice(enabled) => self.set_global_voice(enabled),
            Message::Speak { text, interrupt } => self.say(&text, interrupt),
            Message::AnnouncePageChange(page) => {
                if self.status.borrow().is_blind_mode {
                    self.say(&navigation_announcement(&page), true);
                }
            }
            Message::RouteChanged(route) => self.change_route(route),
            Message::Recognition { session, event } => self.on_recognition(session, event),
            Message::Synthesis { utterance, event } => self.on_synthesis(utterance, &event),
            Message::TimerFired { timer, generation } => {
                if self.timers.take_if_current(timer, generation) {
                    self.on_timer(timer);
                }
            }
            Message::Settle(ack) => {
                let _ = ack.send(());
            }
            Message::Shutdown(ack) => {
                self.teardown();
                let _ = ack.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.drive(SessionInput::Disable);
        self.announcer.silence();
        self.status.send_modify(|s| s.is_processing = false);
    }

    // Modes

    fn set_blind_mode(&mut self, enabled: bool) {
        tracing::info!(enabled, "blind mode toggled");
        self.status.send_modify(|s| {
            s.is_blind_mode = enabled;
            s.is_global_voice_enabled = enabled;
        });

        if let Err(e) = self.preferences.save(&Preferences::with_voice_mode(enabled)) {
            tracing::warn!(error = %e, "failed to save voice preferences");
        }

        self.apply_voice_state();

        if enabled {
            self.say(BLIND_MODE_ON, true);
            self.timers.schedule(TimerKind::ModeSummary, self.mode_summary_delay);
        } else {
            self.timers.cancel(TimerKind::ModeSummary);
            self.timers.cancel(TimerKind::PageAnnouncement);
            self.say(BLIND_MODE_OFF, true);
        }
    }

    fn set_global_voice(&mut self, enabled: bool) {
        tracing::info!(enabled, "global voice toggled");
        self.status.send_modify(|s| s.is_global_voice_enabled = enabled);
        self.apply_voice_state();
        self.say(
            if enabled {
                GLOBAL_VOICE_ON
            } else {
                GLOBAL_VOICE_OFF
            },
            true,
        );
    }

    fn should_listen(&self) -> bool {
        self.capabilities.full_support && self.status.borrow().is_global_voice_enabled
    }

    fn apply_voice_state(&mut self) {
        if self.should_listen() {
            self.drive(SessionInput::Enable);
        } else {
            if self.status.borrow().is_global_voice_enabled {
                tracing::warn!(
                    capabilities = ?self.capabilities,
                    "speech platform incomplete, not listening"
                );
            }
            self.drive(SessionInput::Disable);
        }
    }

    // Session

    /// Feed an input to the session and carry out the resulting effects
    fn drive(&mut self, input: SessionInput) {
        let mut next = Some(input);
        while let Some(input) = next.take() {
            for effect in self.session.handle(input) {
                if let Some(follow_up) = self.apply(effect) {
                    next = Some(follow_up);
                }
            }
        }
        self.sync_session_status();
    }

    fn apply(&mut self, effect: SessionEffect) -> Option<SessionInput> {
        match effect {
            SessionEffect::StartEngine => return self.start_engine(),
            SessionEffect::StopEngine => self.stop_engine(),
            SessionEffect::Schedule(timer, delay) => {
                self.timers.schedule(TimerKind::Session(timer), delay);
            }
            SessionEffect::CancelTimers => self.timers.cancel_session_timers(),
            SessionEffect::ClearProcessing => {
                self.status.send_modify(|s| s.is_processing = false);
            }
            SessionEffect::DisableVoice => {
                self.status.send_modify(|s| s.is_global_voice_enabled = false);
            }
            SessionEffect::AnnouncePermissionDenied => self.say(PERMISSION_DENIED, true),
        }
        None
    }

    fn start_engine(&mut self) -> Option<SessionInput> {
        // Never run two sessions
        self.stop_engine();

        let Some(recognizer) = self.recognizer.as_mut() else {
            tracing::warn!("no recognition engine to start");
            return Some(SessionInput::StartFailed);
        };

        self.next_session += 1;
        let session = SessionId(self.next_session);
        let sink = RecognitionSink::new(session, self.mailbox.clone());

        match recognizer.start(&self.settings, sink) {
            Ok(()) => {
                tracing::debug!(session = session.0, "recognition session started");
                self.engine_session = Some(session);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start recognition");
                Some(SessionInput::StartFailed)
            }
        }
    }

    fn stop_engine(&mut self) {
        let Some(session) = self.engine_session.take() else {
            return;
        };
        if let Some(recognizer) = self.recognizer.as_mut() {
            if let Err(e) = recognizer.stop() {
                tracing::warn!(session = session.0, error = %e, "failed to stop recognition");
            } else {
                tracing::debug!(session = session.0, "recognition session stopped");
            }
        }
    }

    fn sync_session_status(&self) {
        let state = self.session.state();
        self.status.send_if_modified(|s| {
            let listening = state == SessionState::Listening;
            let on_break = state == SessionState::OnBreak;
            let changed = s.is_listening != listening || s.is_on_break != on_break;
            s.is_listening = listening;
            s.is_on_break = on_break;
            changed
        });
    }

    fn on_recognition(&mut self, session: SessionId, event: RecognitionEvent) {
        if self.engine_session != Some(session) {
            tracing::trace!(session = session.0, ?event, "event from inactive session ignored");
            return;
        }

        match event {
            RecognitionEvent::Started => {
                tracing::debug!(session = session.0, "listening");
            }
            RecognitionEvent::Result {
                transcript,
                confidence,
            } => self.on_result(&transcript, confidence),
            RecognitionEvent::Error(kind) => {
                tracing::warn!(session = session.0, error = %kind, "recognition error");
                self.drive(SessionInput::EngineError(kind));
            }
            RecognitionEvent::Ended => {
                tracing::debug!(session = session.0, "recognition ended by engine");
                self.engine_session = None;
                self.drive(SessionInput::EngineEnded);
            }
        }
    }

    fn on_result(&mut self, transcript: &str, confidence: Option<f32>) {
        if !self.dispatcher.passes_confidence_gate(confidence) {
            tracing::debug!(
                transcript,
                ?confidence,
                threshold = self.dispatcher.threshold(),
                "low-confidence result dropped"
            );
            return;
        }

        let heard = transcript.trim();
        tracing::info!(command = heard, ?confidence, "voice command");
        self.status.send_modify(|s| {
            s.last_command = heard.to_string();
            s.command_count += 1;
            s.is_processing = true;
        });

        match self.dispatcher.resolve(&self.registry, heard) {
            Resolution::Custom(entry) => {
                tracing::debug!(phrase = %entry.phrase, "running page command");
                if catch_unwind(AssertUnwindSafe(|| entry.run())).is_ok() {
                    self.say(CUSTOM_COMMAND_CONFIRMATION, true);
                } else {
                    tracing::error!(phrase = %entry.phrase, "page command panicked");
                    self.say(COMMAND_FAILED, true);
                }
            }
            Resolution::Builtin(command) => {
                tracing::debug!(%command, "running built-in command");
                self.run_builtin(command);
                self.observe_host_route();
            }
            Resolution::Unrecognized => {
                self.say(&unrecognized_message(heard), true);
            }
        }
    }

    // Built-ins

    fn run_builtin(&mut self, command: BuiltinCommand) {
        let page = page_name(&self.current_route);

        let reply = match command {
            BuiltinCommand::VoiceOff => return self.set_global_voice(false),
            BuiltinCommand::VoiceOn => return self.set_global_voice(true),
            BuiltinCommand::BlindModeOff => return self.set_blind_mode(false),
            BuiltinCommand::WhereAmI => Some(location_announcement(page)),
            BuiltinCommand::PageHelp => Some(page_help(page, &self.registry)),
            BuiltinCommand::Help => Some(global_help(page)),
            BuiltinCommand::Repeat => Some(
                self.announcer
                    .last_spoken()
                    .unwrap_or(NOTHING_TO_REPEAT)
                    .to_string(),
            ),
            _ => None,
        };
        if let Some(reply) = reply {
            self.say(&reply, true);
            return;
        }

        match command {
            BuiltinCommand::Navigate { route, .. } => self.with_host(|h| h.navigate(route)),
            BuiltinCommand::Refresh => self.with_host(|h| h.reload()),
            BuiltinCommand::ScrollUp => self.with_host(|h| h.scroll_by(-SCROLL_STEP)),
            BuiltinCommand::ScrollDown => self.with_host(|h| h.scroll_by(SCROLL_STEP)),
            BuiltinCommand::ScrollToTop => self.with_host(|h| h.scroll_to_top()),
            BuiltinCommand::ScrollToBottom => self.with_host(|h| h.scroll_to_bottom()),
            BuiltinCommand::Back => self.with_host(|h| h.history_back()),
            BuiltinCommand::Forward => self.with_host(|h| h.history_forward()),
            _ => {}
        }

        if let Some(confirmation) = command.confirmation() {
            self.say(confirmation, true);
        }
    }

    fn with_host(&mut self, f: impl FnOnce(&mut dyn PageHost)) {
        match self.host.as_mut() {
            Some(host) => f(&mut **host),
            None => tracing::debug!("no page host, command has no effect"),
        }
    }

    // Pages

    fn observe_host_route(&mut self) {
        let Some(route) = self.host.as_ref().map(|h| h.current_route()) else {
            return;
        };
        self.change_route(route);
    }

    fn change_route(&mut self, route: String) {
        if route == self.current_route {
            return;
        }

        tracing::debug!(from = %self.current_route, to = %route, "route changed");
        self.current_route = route;

        if self.status.borrow().is_blind_mode {
            self.timers.schedule(TimerKind::PageAnnouncement, self.page_announcement_delay);
        }
    }

    fn on_timer(&mut self, timer: TimerKind) {
        match timer {
            TimerKind::Session(SessionTimer::Break) => self.drive(SessionInput::BreakElapsed),
            TimerKind::Session(SessionTimer::Resume) => {
                if self.should_listen() {
                    self.drive(SessionInput::ResumeElapsed);
                } else {
                    self.drive(SessionInput::Disable);
                }
            }
            TimerKind::Session(SessionTimer::Restart) => self.drive(SessionInput::RestartElapsed),
            TimerKind::PageAnnouncement => {
                if self.status.borrow().is_blind_mode {
                    let text = navigation_announcement(page_name(&self.current_route));
                    self.say(&text, true);
                }
            }
            TimerKind::ModeSummary => {
                if self.status.borrow().is_blind_mode {
                    let text = location_announcement(page_name(&self.current_route));
                    self.say(&text, true);
                }
            }
        }
    }

    // Speech

    fn say(&mut self, text: &str, interrupt: bool) {
        let submitted = self.announcer.speak(text, interrupt).is_some();
        self.status.send_if_modified(|s| {
            let changed = s.is_processing != submitted;
            s.is_processing = submitted;
            changed
        });
    }

    fn on_synthesis(&mut self, utterance: UtteranceId, event: &SynthesisEvent) {
        if let SynthesisEvent::Failed(reason) = event {
            tracing::debug!(utterance = utterance.0, %reason, "announcement did not finish");
        }

        if self.announcer.complete(utterance) {
            self.status.send_modify(|s| s.is_processing = false);
        }
    }
}
