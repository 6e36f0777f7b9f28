//! linK Voice - global voice command controller
//!
//! Keeps a continuous speech-recognition session alive across an
//! accessibility-first application and turns what the user says into
//! navigation, page control, and page-specific actions, answering every
//! command out loud.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 VoiceController handle               │
//! │  toggles │ speak │ page scopes │ status watch        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ mailbox
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Controller actor                    │
//! │  Session FSM │ Dispatcher │ Announcer │ Page binder │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Platform collaborators                 │
//! │  RecognitionEngine │ SynthesisEngine │ PageHost     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod pages;
pub mod preferences;
pub mod status;
pub mod voice;

pub use commands::{BuiltinCommand, CommandAction, CommandEntry, CommandRegistry, Dispatcher};
pub use config::Config;
pub use controller::{PageScope, VoiceController, VoiceControllerBuilder};
pub use error::{Error, Result};
pub use pages::{PageHost, page_name};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences};
pub use status::{Capabilities, VoiceStatus};
pub use voice::{
    RecognitionEngine, RecognitionErrorKind, RecognitionSettings, RecognitionSink, SessionState,
    SynthesisEngine, SynthesisSink, Utterance, UtteranceId,
};
