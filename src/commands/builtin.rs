//! Compiled-in global commands
//!
//! Built-ins match by substring in table order; the first group with a
//! matching trigger wins.

use std::fmt;

/// Scroll distance for "scroll up" and "scroll down"
pub const SCROLL_STEP: i32 = 300;

/// A global built-in command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    /// Navigate to a route and announce it
    Navigate {
        /// Target route
        route: &'static str,
        /// Spoken confirmation
        announcement: &'static str,
    },
    /// Turn global voice off
    VoiceOff,
    /// Turn global voice on
    VoiceOn,
    /// Leave blind accessibility mode
    BlindModeOff,
    /// Say which page is showing
    WhereAmI,
    /// List the commands registered by the current page
    PageHelp,
    /// List the global commands
    Help,
    /// Repeat the last announcement
    Repeat,
    /// Reload the page
    Refresh,
    /// Scroll up one step
    ScrollUp,
    /// Scroll down one step
    ScrollDown,
    /// Scroll to the top of the page
    ScrollToTop,
    /// Scroll to the bottom of the page
    ScrollToBottom,
    /// Go back in history
    Back,
    /// Go forward in history
    Forward,
}

/// Built-in groups in match order with their trigger substrings
pub const BUILTIN_GROUPS: &[(BuiltinCommand, &[&str])] = &[
    (
        BuiltinCommand::Navigate {
            route: "/",
            announcement: "Going to home page",
        },
        &["go home", "home page", "navigate home"],
    ),
    (
        BuiltinCommand::Navigate {
            route: "/chat",
            announcement: "Opening chat assistant",
        },
        &["go to chat", "chat assistant", "open chat"],
    ),
    (
        BuiltinCommand::Navigate {
            route: "/deaf",
            announcement: "Going to deaf learning section",
        },
        &["deaf learning", "deaf section", "sign language"],
    ),
    (
        BuiltinCommand::Navigate {
            route: "/blind",
            announcement: "Going to blind accessibility section",
        },
        &["blind section", "blind accessibility", "accessibility tools"],
    ),
    (
        BuiltinCommand::Navigate {
            route: "/tools",
            announcement: "Going to AI tools page",
        },
        &["ai tools", "go to tools", "tools page"],
    ),
    (
        BuiltinCommand::Navigate {
            route: "/about",
            announcement: "Going to about page",
        },
        &["about page", "go to about", "about us"],
    ),
    (
        BuiltinCommand::Navigate {
            route: "/settings",
            announcement: "Going to settings",
        },
        &["settings page", "go to settings", "open settings"],
    ),
    (
        BuiltinCommand::VoiceOff,
        &["disable voice", "stop voice", "turn off voice"],
    ),
    (
        BuiltinCommand::VoiceOn,
        &["enable voice", "start voice", "turn on voice"],
    ),
    (
        BuiltinCommand::BlindModeOff,
        &["exit blind mode", "disable blind mode", "turn off accessibility"],
    ),
    (
        BuiltinCommand::WhereAmI,
        &["where am i", "current page", "what page"],
    ),
    (
        BuiltinCommand::PageHelp,
        &["what can i do here", "page commands"],
    ),
    (
        BuiltinCommand::Help,
        &["help", "what can i do", "commands", "available commands"],
    ),
    (
        BuiltinCommand::Repeat,
        &["repeat", "say again", "what did you say"],
    ),
    (
        BuiltinCommand::Refresh,
        &["refresh", "reload page", "refresh page"],
    ),
    (BuiltinCommand::ScrollUp, &["scroll up", "go up"]),
    (BuiltinCommand::ScrollDown, &["scroll down", "go down"]),
    (BuiltinCommand::ScrollToTop, &["scroll to top", "go to top"]),
    (
        BuiltinCommand::ScrollToBottom,
        &["scroll to bottom", "go to bottom"],
    ),
    (BuiltinCommand::Back, &["go back", "previous page", "back"]),
    (
        BuiltinCommand::Forward,
        &["go forward", "next page", "forward"],
    ),
];

impl BuiltinCommand {
    /// Find the built-in a normalized transcript triggers
    #[must_use]
    pub fn classify(normalized: &str) -> Option<Self> {
        BUILTIN_GROUPS
            .iter()
            .find(|(_, triggers)| triggers.iter().any(|t| normalized.contains(t)))
            .map(|(command, _)| *command)
    }

    /// Trigger phrases for this command
    #[must_use]
    pub fn triggers(self) -> &'static [&'static str] {
        BUILTIN_GROUPS
            .iter()
            .find(|(command, _)| *command == self)
            .map_or(&[], |(_, triggers)| *triggers)
    }

    /// Fixed confirmation spoken after the command runs, if it has one
    #[must_use]
    pub const fn confirmation(self) -> Option<&'static str> {
        match self {
            Self::Navigate { announcement, .. } => Some(announcement),
            Self::Refresh => Some("Page refreshed"),
            Self::ScrollUp => Some("Scrolled up"),
            Self::ScrollDown => Some("Scrolled down"),
            Self::ScrollToTop => Some("Scrolled to top of page"),
            Self::ScrollToBottom => Some("Scrolled to bottom of page"),
            Self::Back => Some("Going back to previous page"),
            Self::Forward => Some("Going forward"),
            Self::VoiceOff
            | Self::VoiceOn
            | Self::BlindModeOff
            | Self::WhereAmI
            | Self::PageHelp
            | Self::Help
            | Self::Repeat => None,
        }
    }
}

impl fmt::Display for BuiltinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { route, .. } => write!(f, "navigate {route}"),
            Self::VoiceOff => write!(f, "voice off"),
            Self::VoiceOn => write!(f, "voice on"),
            Self::BlindModeOff => write!(f, "blind mode off"),
            Self::WhereAmI => write!(f, "where am i"),
            Self::PageHelp => write!(f, "page help"),
            Self::Help => write!(f, "help"),
            Self::Repeat => write!(f, "repeat"),
            Self::Refresh => write!(f, "refresh"),
            Self::ScrollUp => write!(f, "scroll up"),
            Self::ScrollDown => write!(f, "scroll down"),
            Self::ScrollToTop => write!(f, "scroll to top"),
            Self::ScrollToBottom => write!(f, "scroll to bottom"),
            Self::Back => write!(f, "back"),
            Self::Forward => write!(f, "forward"),
        }
    }
}
