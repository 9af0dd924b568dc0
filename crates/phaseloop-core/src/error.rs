//! Error types for phaseloop

use crate::phase::{Phase, PhaseTag};
use thiserror::Error;

/// The main error type for phaseloop operations
#[derive(Debug, Error)]
pub enum PhaseLoopError {
    #[error(
        "Fatal: host phase structure incompatible ({phase}): expected {expected} at index {index}, found {}",
        describe_found(.found)
    )]
    IntegrityViolation {
        phase: Phase,
        index: usize,
        expected: PhaseTag,
        found: Option<PhaseTag>,
    },

    #[error("Unknown mode transition: {0}")]
    UnknownModeTransition(i32),

    #[error("Invalid session transition: {event} while {state}")]
    InvalidSessionTransition { event: String, state: String },

    #[error("Callback failed: {0}")]
    CallbackFailed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

fn describe_found(found: &Option<PhaseTag>) -> String {
    match found {
        Some(tag) => tag.to_string(),
        None => "nothing".to_string(),
    }
}

/// Result type alias for phaseloop operations
pub type Result<T> = std::result::Result<T, PhaseLoopError>;

impl From<toml::de::Error> for PhaseLoopError {
    fn from(err: toml::de::Error) -> Self {
        PhaseLoopError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for PhaseLoopError {
    fn from(err: toml::ser::Error) -> Self {
        PhaseLoopError::TomlSerError(err.to_string())
    }
}
