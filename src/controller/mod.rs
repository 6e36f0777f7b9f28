//! Global voice controller
//!
//! [`VoiceControllerBuilder::spawn`] starts the controller actor on the
//! current tokio runtime and returns a cloneable [`VoiceController`] handle.
//! Handle methods post to the actor's mailbox and return immediately; use
//! [`VoiceController::settle`] to wait until everything posted so far has
//! been handled.

mod actor;
mod message;
mod scope;
mod timers;

pub(crate) use message::{Mailbox, Message, WeakMailbox};
pub use scope::PageScope;

use tokio::sync::{mpsc, oneshot, watch};

use crate::commands::CommandEntry;
use crate::config::Config;
use crate::preferences::{FilePreferenceStore, PreferenceStore};
use crate::status::{Capabilities, VoiceStatus};
use crate::voice::{Announcer, RecognitionEngine, SynthesisEngine};
use crate::{Error, PageHost, Result};

/// Handle to a running voice controller
#[derive(Debug, Clone)]
pub struct VoiceController {
    mailbox: Mailbox,
    status: watch::Receiver<VoiceStatus>,
    capabilities: Capabilities,
}

impl VoiceController {
    /// Start building a controller
    #[must_use]
    pub fn builder(config: Config) -> VoiceControllerBuilder {
        VoiceControllerBuilder::new(config)
    }

    fn post(&self, message: Message) -> Result<()> {
        if self.mailbox.send(message) {
            Ok(())
        } else {
            Err(Error::ControllerClosed)
        }
    }

    /// Register a page command; a later registration of the same phrase wins
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn add_custom_command(
        &self,
        phrase: &str,
        action: impl Fn() + Send + Sync + 'static,
        description: impl Into<String>,
    ) -> Result<()> {
        self.post(Message::AddCommand(CommandEntry::new(
            phrase,
            action,
            description,
        )))
    }

    /// Remove a page command; unknown phrases are ignored
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn remove_custom_command(&self, phrase: &str) -> Result<()> {
        self.post(Message::RemoveCommand {
            phrase: phrase.to_string(),
        })
    }

    /// Open a scope whose commands are removed when it is dropped
    #[must_use]
    pub fn page_scope(&self) -> PageScope {
        PageScope::new(self.clone())
    }

    /// Turn blind accessibility mode on or off
    ///
    /// Global voice follows blind mode and the choice is persisted.
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn toggle_blind_mode(&self, enabled: bool) -> Result<()> {
        self.post(Message::ToggleBlindMode(enabled))
    }

    /// Start or stop continuous listening without changing blind mode
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn toggle_global_voice(&self, enabled: bool) -> Result<()> {
        self.post(Message::ToggleGlobalVoice(enabled))
    }

    /// Speak text, cancelling current speech first when `interrupt` is set
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn speak(&self, text: impl Into<String>, interrupt: bool) -> Result<()> {
        self.post(Message::Speak {
            text: text.into(),
            interrupt,
        })
    }

    /// Announce arrival on a page, if blind mode is on
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn announce_page_change(&self, page: impl Into<String>) -> Result<()> {
        self.post(Message::AnnouncePageChange(page.into()))
    }

    /// Tell the controller the host navigated to `route`
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn route_changed(&self, route: impl Into<String>) -> Result<()> {
        self.post(Message::RouteChanged(route.into()))
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> VoiceStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VoiceStatus> {
        self.status.clone()
    }

    /// Which speech engines are available
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Wait until every message posted before this call has been handled
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub async fn settle(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.post(Message::Settle(tx))?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }

    /// Stop listening, cancel every timer, and stop the actor
    ///
    /// # Errors
    ///
    /// Returns error if the controller had already shut down
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.post(Message::Shutdown(tx))?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }
}

/// Assembles a controller from its collaborators
pub struct VoiceControllerBuilder {
    config: Config,
    recognizer: Option<Box<dyn RecognitionEngine>>,
    synthesizer: Option<Box<dyn SynthesisEngine>>,
    host: Option<Box<dyn PageHost>>,
    preferences: Option<Box<dyn PreferenceStore>>,
}

impl std::fmt::Debug for VoiceControllerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceControllerBuilder")
            .field("config", &self.config)
            .field("recognizer", &self.recognizer.is_some())
            .field("synthesizer", &self.synthesizer.is_some())
            .field("host", &self.host.is_some())
            .finish_non_exhaustive()
    }
}

impl VoiceControllerBuilder {
    /// Start with no engines, no page host, and file-backed preferences
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            recognizer: None,
            synthesizer: None,
            host: None,
            preferences: None,
        }
    }

    /// Speech-recognition engine
    #[must_use]
    pub fn recognition(mut self, engine: impl RecognitionEngine + 'static) -> Self {
        self.recognizer = Some(Box::new(engine));
        self
    }

    /// Speech-synthesis engine
    #[must_use]
    pub fn synthesis(mut self, engine: impl SynthesisEngine + 'static) -> Self {
        self.synthesizer = Some(Box::new(engine));
        self
    }

    /// UI surface built-in commands act on
    #[must_use]
    pub fn page_host(mut self, host: impl PageHost + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Where the voice-mode preference lives
    #[must_use]
    pub fn preferences(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.preferences = Some(Box::new(store));
        self
    }

    /// Spawn the controller actor
    ///
    /// Loads the saved preference and resumes listening if blind mode was on.
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn spawn(self) -> VoiceController {
        let (tx, rx) = mpsc::unbounded_channel();
        let mailbox = Mailbox::new(tx);
        let (status_tx, status_rx) = watch::channel(VoiceStatus::default());

        let capabilities = Capabilities::new(self.recognizer.is_some(), self.synthesizer.is_some());
        if !capabilities.full_support {
            tracing::warn!(?capabilities, "speech platform incomplete, voice control limited");
        }

        let preferences = self.preferences.unwrap_or_else(|| {
            Box::new(FilePreferenceStore::new(
                &self.config.preferences.dir,
                &self.config.preferences.key,
            ))
        });

        let announcer = Announcer::new(self.synthesizer, &self.config.voice, mailbox.downgrade());

        let mut actor = actor::Actor::new(
            actor::Parts {
                voice: self.config.voice,
                initial_route: self.config.initial_route,
                recognizer: self.recognizer,
                announcer,
                host: self.host,
                preferences,
                capabilities,
            },
            status_tx,
            mailbox.downgrade(),
        );
        actor.restore();

        tokio::spawn(actor.run(rx));

        VoiceController {
            mailbox,
            status: status_rx,
            capabilities,
        }
    }
}
