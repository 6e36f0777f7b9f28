//! Error types for the voice controller

use thiserror::Error;

/// Result type alias for voice controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice controller
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech recognition engine error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis engine error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Preference storage error
    #[error("preference error: {0}")]
    Preference(String),

    /// The controller task has stopped and no longer accepts requests
    #[error("voice controller is not running")]
    ControllerClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
