//! TOML configuration file loading
//!
//! Supports `~/.config/link/voice/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VoiceConfigFile {
    /// Route the page host starts on (e.g. "/")
    #[serde(default)]
    pub initial_route: Option<String>,

    /// Recognition and announcement tuning
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Persisted preference location
    #[serde(default)]
    pub preferences: PreferencesFileConfig,
}

/// Recognition and announcement tuning
///
/// Durations are expressed in milliseconds.
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Recognition and synthesis language (e.g. "en-US")
    pub language: Option<String>,

    /// Results at or below this confidence are dropped
    pub confidence_threshold: Option<f32>,

    /// How long a session listens before taking a break
    pub listen_window_ms: Option<u64>,

    /// Length of the listening break
    pub break_ms: Option<u64>,

    /// Restart delay after a `no-speech` error
    pub no_speech_retry_ms: Option<u64>,

    /// Restart delay after any other recognition error
    pub error_retry_ms: Option<u64>,

    /// Restart delay after the engine ends on its own
    pub end_restart_ms: Option<u64>,

    /// Retry delay when the engine refuses to start
    pub start_retry_ms: Option<u64>,

    /// Delay before announcing a page change
    pub page_announcement_delay_ms: Option<u64>,

    /// Delay before the current-page summary after enabling blind mode
    pub mode_summary_delay_ms: Option<u64>,

    /// Speech rate for announcements
    pub speech_rate: Option<f32>,

    /// Speech volume for announcements
    pub speech_volume: Option<f32>,
}

/// Persisted preference location
#[derive(Debug, Default, Deserialize)]
pub struct PreferencesFileConfig {
    /// Directory holding the preference record
    pub dir: Option<String>,

    /// Key the preference record is stored under
    pub key: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `VoiceConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> VoiceConfigFile {
    let Some(path) = config_file_path() else {
        return VoiceConfigFile::default();
    };

    if !path.exists() {
        return VoiceConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            VoiceConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<VoiceConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/link/voice/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("link")
            .join("voice")
            .join("config.toml")
    })
}
