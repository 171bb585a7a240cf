//! Error types for simulation input validation
//!
//! All three kinds are unrecoverable for the run that discovers them: the
//! simulator never guesses or repairs tournament data. Each error carries a
//! stable code so upstream callers can report the violated invariant precisely.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

/// Error kinds for loading and validating simulation inputs
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed or self-contradictory tournament format
    #[error("format error [{code}]: {message}")]
    Format { code: &'static str, message: String },

    /// Tournament state that disagrees with itself or with the format
    #[error("state inconsistency [{code}]: {message}")]
    StateInconsistency { code: &'static str, message: String },

    /// Invalid simulation settings
    #[error("config error [{code}]: {message}")]
    Config { code: &'static str, message: String },
}

impl SimError {
    pub fn format(code: &'static str, message: impl Into<String>) -> Self {
        SimError::Format {
            code,
            message: message.into(),
        }
    }

    pub fn state(code: &'static str, message: impl Into<String>) -> Self {
        SimError::StateInconsistency {
            code,
            message: message.into(),
        }
    }

    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        SimError::Config {
            code,
            message: message.into(),
        }
    }

    /// Stable error code for upstream reporting
    pub fn code(&self) -> &'static str {
        match self {
            SimError::Format { code, .. } => code,
            SimError::StateInconsistency { code, .. } => code,
            SimError::Config { code, .. } => code,
        }
    }
}
