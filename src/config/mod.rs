//! Configuration management for the voice controller

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};
use file::VoiceConfigFile;

/// Default key the voice-mode preference is stored under
pub const DEFAULT_PREFERENCE_KEY: &str = "linK_blindMode";

/// Voice controller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Route the page host starts on
    pub initial_route: String,

    /// Recognition and announcement tuning
    pub voice: VoiceConfig,

    /// Persisted preference location
    pub preferences: PreferenceConfig,
}

/// Recognition and announcement tuning
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// Recognition and synthesis language
    pub language: String,

    /// Results at or below this confidence are dropped
    pub confidence_threshold: f32,

    /// How long a session listens before taking a break
    pub listen_window: Duration,

    /// Length of the listening break
    pub break_duration: Duration,

    /// Restart delay after a `no-speech` error
    pub no_speech_retry: Duration,

    /// Restart delay after any other recognition error
    pub error_retry: Duration,

    /// Restart delay after the engine ends on its own
    pub end_restart: Duration,

    /// Retry delay when the engine refuses to start
    pub start_retry: Duration,

    /// Delay before announcing a page change
    pub page_announcement_delay: Duration,

    /// Delay before the current-page summary after enabling blind mode
    pub mode_summary_delay: Duration,

    /// Speech rate for announcements
    pub speech_rate: f32,

    /// Speech volume for announcements (0.0 to 1.0)
    pub speech_volume: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            confidence_threshold: 0.4,
            listen_window: Duration::from_millis(20_000),
            break_duration: Duration::from_millis(1_500),
            no_speech_retry: Duration::from_millis(800),
            error_retry: Duration::from_millis(1_500),
            end_restart: Duration::from_millis(2_000),
            start_retry: Duration::from_millis(2_000),
            page_announcement_delay: Duration::from_millis(500),
            mode_summary_delay: Duration::from_millis(3_000),
            speech_rate: 0.9,
            speech_volume: 0.8,
        }
    }
}

/// Persisted preference location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceConfig {
    /// Directory holding the preference record
    pub dir: PathBuf,

    /// Key the preference record is stored under
    pub key: String,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            dir: default_preference_dir(),
            key: DEFAULT_PREFERENCE_KEY.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_route: "/".to_string(),
            voice: VoiceConfig::default(),
            preferences: PreferenceConfig::default(),
        }
    }
}

/// Return the platform config directory for preferences
///
/// Uses `~/.config/link/voice/` on Linux
fn default_preference_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "link", "voice").map_or_else(
        || PathBuf::from(".link-voice"),
        |d| d.config_dir().to_path_buf(),
    )
}

impl Config {
    /// Load configuration from defaults, the TOML config file, and environment
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::from_file(file::load_config_file())
    }

    /// Build configuration from a parsed config file plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn from_file(fc: VoiceConfigFile) -> Result<Self> {
        let default = VoiceConfig::default();
        let ms = |value: Option<u64>, fallback: Duration| {
            value.map_or(fallback, Duration::from_millis)
        };

        let voice = VoiceConfig {
            language: std::env::var("LINK_VOICE_LANGUAGE")
                .ok()
                .or(fc.voice.language)
                .unwrap_or(default.language),
            confidence_threshold: std::env::var("LINK_VOICE_CONFIDENCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.voice.confidence_threshold)
                .unwrap_or(default.confidence_threshold),
            listen_window: ms(fc.voice.listen_window_ms, default.listen_window),
            break_duration: ms(fc.voice.break_ms, default.break_duration),
            no_speech_retry: ms(fc.voice.no_speech_retry_ms, default.no_speech_retry),
            error_retry: ms(fc.voice.error_retry_ms, default.error_retry),
            end_restart: ms(fc.voice.end_restart_ms, default.end_restart),
            start_retry: ms(fc.voice.start_retry_ms, default.start_retry),
            page_announcement_delay: ms(
                fc.voice.page_announcement_delay_ms,
                default.page_announcement_delay,
            ),
            mode_summary_delay: ms(fc.voice.mode_summary_delay_ms, default.mode_summary_delay),
            speech_rate: fc.voice.speech_rate.unwrap_or(default.speech_rate),
            speech_volume: fc.voice.speech_volume.unwrap_or(default.speech_volume),
        };

        let preferences = PreferenceConfig {
            dir: std::env::var("LINK_VOICE_PREFERENCES_DIR")
                .ok()
                .or(fc.preferences.dir)
                .map_or_else(default_preference_dir, |dir| {
                    PathBuf::from(shell_home(&dir))
                }),
            key: fc
                .preferences
                .key
                .unwrap_or_else(|| DEFAULT_PREFERENCE_KEY.to_string()),
        };

        let initial_route = std::env::var("LINK_VOICE_ROUTE")
            .ok()
            .or(fc.initial_route)
            .unwrap_or_else(|| "/".to_string());

        let config = Self {
            initial_route,
            voice,
            preferences,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that values are usable
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let threshold = self.voice.confidence_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be in [0, 1), got {threshold}"
            )));
        }

        if !(0.0..=1.0).contains(&self.voice.speech_volume) {
            return Err(Error::Config(format!(
                "speech_volume must be in [0, 1], got {}",
                self.voice.speech_volume
            )));
        }

        if !(0.1..=10.0).contains(&self.voice.speech_rate) {
            return Err(Error::Config(format!(
                "speech_rate must be in [0.1, 10], got {}",
                self.voice.speech_rate
            )));
        }

        if self.voice.listen_window.is_zero() {
            return Err(Error::Config("listen_window must be non-zero".to_string()));
        }

        if !self.initial_route.starts_with('/') {
            return Err(Error::Config(format!(
                "initial_route must start with '/', got {:?}",
                self.initial_route
            )));
        }

        if self.preferences.key.trim().is_empty()
            || self
                .preferences
                .key
                .contains(|c: char| std::path::is_separator(c) || c == '.')
        {
            return Err(Error::Config(format!(
                "preference key must be a plain name, got {:?}",
                self.preferences.key
            )));
        }

        Ok(())
    }
}

/// Expand a leading `~/` to the home directory
fn shell_home(path: &str) -> String {
    match (path.strip_prefix("~/"), directories::BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest).display().to_string(),
        _ => path.to_string(),
    }
}
