//! Status surface shared with UI indicators

use serde::Serialize;

/// Snapshot of the controller state
///
/// Published by the controller after every change; consumers only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStatus {
    /// Recognition session is actively listening
    pub is_listening: bool,

    /// Recognition session is in a scheduled listening break
    pub is_on_break: bool,

    /// A command or announcement is in flight
    pub is_processing: bool,

    /// Last accepted transcript, as heard
    pub last_command: String,

    /// Number of transcripts accepted since startup
    pub command_count: u64,

    /// Blind accessibility mode is on
    pub is_blind_mode: bool,

    /// Global voice commands are enabled
    pub is_global_voice_enabled: bool,
}

impl VoiceStatus {
    /// Short label for status indicators
    #[must_use]
    pub const fn label(&self) -> &'static str {
        if self.is_processing {
            "Processing..."
        } else if self.is_on_break {
            "Taking Break"
        } else if self.is_listening {
            "Listening"
        } else if self.is_global_voice_enabled {
            "Voice Ready"
        } else {
            "Voice Off"
        }
    }
}

/// Which speech collaborators are available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// A recognition engine is available
    pub speech_recognition: bool,

    /// A synthesis engine is available
    pub speech_synthesis: bool,

    /// Both engines are available
    pub full_support: bool,
}

impl Capabilities {
    /// Derive capabilities from engine availability
    #[must_use]
    pub const fn new(speech_recognition: bool, speech_synthesis: bool) -> Self {
        Self {
            speech_recognition,
            speech_synthesis,
            full_support: speech_recognition && speech_synthesis,
        }
    }
}
