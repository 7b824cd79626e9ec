//! Error types shared across AimForge crates.

use std::path::PathBuf;

/// Top-level error type for AimForge operations.
///
/// Only [`AimError::MissingSetup`] and [`AimError::InvalidSetup`] may stop a
/// battery from starting. Everything raised while a run is in progress is
/// logged and absorbed by the caller.
#[derive(Debug, thiserror::Error)]
pub enum AimError {
    #[error("Setup record not found: {}", path.display())]
    MissingSetup { path: PathBuf },

    #[error("Invalid setup record: {message}")]
    InvalidSetup { message: String },

    #[error("Result submission failed: {message}")]
    Submission { message: String },

    #[error("Scenario error: {message}")]
    Scenario { message: String },

    #[error("Telemetry error: {message}")]
    Telemetry { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using AimError.
pub type AimResult<T> = Result<T, AimError>;

impl AimError {
    pub fn missing_setup(path: impl Into<PathBuf>) -> Self {
        Self::MissingSetup { path: path.into() }
    }

    pub fn invalid_setup(msg: impl Into<String>) -> Self {
        Self::InvalidSetup {
            message: msg.into(),
        }
    }

    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission {
            message: msg.into(),
        }
    }

    pub fn scenario(msg: impl Into<String>) -> Self {
        Self::Scenario {
            message: msg.into(),
        }
    }

    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is a precondition failure that must prevent a
    /// battery from starting.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingSetup { .. } | Self::InvalidSetup { .. })
    }
}
