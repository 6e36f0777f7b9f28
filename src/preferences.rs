//! Persisted voice-mode preference
//!
//! The record is versioned so fields can be added later without guessing at
//! the stored format. The bare `true`/`false` flag written by earlier releases
//! is still accepted and upgraded on the next save.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Current preference record version
pub const PREFERENCE_VERSION: u32 = 1;

/// Persisted voice-mode preference record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Record format version
    #[serde(default)]
    pub version: u32,

    /// Blind/global voice mode enabled
    #[serde(default)]
    pub voice_mode_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCE_VERSION,
            voice_mode_enabled: false,
        }
    }
}

impl Preferences {
    /// Record with voice mode set
    #[must_use]
    pub const fn with_voice_mode(voice_mode_enabled: bool) -> Self {
        Self {
            version: PREFERENCE_VERSION,
            voice_mode_enabled,
        }
    }

    /// Parse a stored record, accepting the legacy bare flag
    ///
    /// # Errors
    ///
    /// Returns error if the content is neither a legacy flag nor a valid record
    pub fn parse(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        match trimmed {
            "" => return Ok(Self::default()),
            "true" | "false" => {
                tracing::debug!("migrating legacy voice-mode flag");
                return Ok(Self::with_voice_mode(trimmed == "true"));
            }
            _ => {}
        }

        let mut prefs: Self = serde_json::from_str(trimmed)?;
        if prefs.version > PREFERENCE_VERSION {
            tracing::warn!(
                version = prefs.version,
                supported = PREFERENCE_VERSION,
                "preference record is newer than this build, reading known fields"
            );
        }
        prefs.version = PREFERENCE_VERSION;
        Ok(prefs)
    }
}

/// Storage for the voice-mode preference
pub trait PreferenceStore: Send {
    /// Load the stored record, or defaults when nothing is stored
    ///
    /// # Errors
    ///
    /// Returns error if stored data exists but cannot be read
    fn load(&self) -> Result<Preferences>;

    /// Overwrite the stored record
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be written
    fn save(&mut self, prefs: &Preferences) -> Result<()>;
}

/// Preference record stored as a key-named JSON file
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Store the record under `<dir>/<key>.json`
    #[must_use]
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{key}.json")),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let prefs = Preferences::parse(&content).map_err(|e| {
            Error::Preference(format!("{}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), ?prefs, "loaded preferences");
        Ok(prefs)
    }

    fn save(&mut self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), ?prefs, "saved preferences");
        Ok(())
    }
}

/// In-memory preference store
///
/// Clones share the same record, so a caller can keep one clone to inspect
/// what the controller saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    record: Arc<Mutex<Option<Preferences>>>,
}

impl MemoryPreferenceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an initial record
    #[must_use]
    pub fn with(prefs: Preferences) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(prefs))),
        }
    }

    /// Last saved record, if any
    #[must_use]
    pub fn saved(&self) -> Option<Preferences> {
        self.record.lock().ok().and_then(|r| *r)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Preferences> {
        let record = self
            .record
            .lock()
            .map_err(|_| Error::Preference("preference lock poisoned".to_string()))?;
        Ok(record.unwrap_or_default())
    }

    fn save(&mut self, prefs: &Preferences) -> Result<()> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| Error::Preference("preference lock poisoned".to_string()))?;
        *record = Some(*prefs);
        Ok(())
    }
}
