//! Transcript routing

use super::{BuiltinCommand, CommandEntry, CommandRegistry, normalize_phrase};

/// Spoken after a page command runs
pub const CUSTOM_COMMAND_CONFIRMATION: &str = "Command executed.";

/// Where a transcript resolved to
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Exact match in the dynamic registry
    Custom(CommandEntry),
    /// Substring match against a built-in group
    Builtin(BuiltinCommand),
    /// Nothing matched
    Unrecognized,
}

/// Confidence gate and command resolution
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    threshold: f32,
}

impl Dispatcher {
    /// Create a dispatcher accepting results above `threshold`
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Confidence threshold in use
    #[must_use]
    pub const fn threshold(self) -> f32 {
        self.threshold
    }

    /// Whether a result with this confidence should be acted on
    ///
    /// Engines that report no confidence are trusted.
    #[must_use]
    pub fn passes_confidence_gate(self, confidence: Option<f32>) -> bool {
        confidence.is_none_or(|c| c > self.threshold)
    }

    /// Resolve a transcript against the registry and the built-ins
    #[must_use]
    pub fn resolve(self, registry: &CommandRegistry, transcript: &str) -> Resolution {
        let normalized = normalize_phrase(transcript);

        if let Some(entry) = registry.get(&normalized) {
            return Resolution::Custom(entry.clone());
        }

        BuiltinCommand::classify(&normalized).map_or(Resolution::Unrecognized, Resolution::Builtin)
    }
}

/// Spoken when nothing matched
#[must_use]
pub fn unrecognized_message(transcript: &str) -> String {
    format!("I didn't understand \"{transcript}\". Say \"help\" to hear available commands.")
}

/// Global help for the current page
#[must_use]
pub fn global_help(page: &str) -> String {
    format!(
        "Global voice commands available on {page}. \
         Navigation: \"go home\", \"go to chat\", \"deaf learning\", \"blind section\", \"ai tools\", \"about page\", \"settings page\". \
         Page control: \"scroll up\", \"scroll down\", \"go to top\", \"go to bottom\", \"refresh page\", \"go back\", \"go forward\". \
         Information: \"where am i\", \"current page\", \"repeat\", \"help\". \
         Voice control: \"disable voice\", \"exit blind mode\". \
         Page-specific commands may also be available. Try saying \"what can I do here\" for page-specific help."
    )
}

/// Commands registered by the current page
#[must_use]
pub fn page_help(page: &str, registry: &CommandRegistry) -> String {
    if registry.is_empty() {
        return format!(
            "There are no page-specific commands on the {page}. Say \"help\" to hear global commands."
        );
    }

    let commands = registry
        .entries()
        .iter()
        .map(|entry| format!("\"{}\" to {}", entry.phrase, entry.description))
        .collect::<Vec<_>>()
        .join(", ");

    format!("Commands on the {page}: {commands}.")
}
