//! The setup record produced by the setup screen.
//!
//! A battery cannot start without it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use aimforge_common::error::{AimError, AimResult};

use crate::conversion::GameProfile;

/// Base parameters for a battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupRecord {
    /// Mouse DPI.
    pub dpi: f64,

    /// In-game sensitivity.
    pub sensitivity: f64,

    /// User identifier sent with every result.
    pub user: String,

    /// Scenario test type requested by the setup screen.
    pub test_type: String,

    /// Game whose conversion constant applies.
    #[serde(default)]
    pub game: GameProfile,
}

impl SetupRecord {
    pub fn new(
        dpi: f64,
        sensitivity: f64,
        user: impl Into<String>,
        test_type: impl Into<String>,
    ) -> Self {
        Self {
            dpi,
            sensitivity,
            user: user.into(),
            test_type: test_type.into(),
            game: GameProfile::default(),
        }
    }

    /// Load and validate a setup record.
    ///
    /// A missing file is [`AimError::MissingSetup`]; an unreadable or
    /// out-of-range record is [`AimError::InvalidSetup`].
    pub fn load(path: impl AsRef<Path>) -> AimResult<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AimError::missing_setup(path));
            }
            Err(e) => return Err(e.into()),
        };

        let record: SetupRecord = serde_json::from_str(&content)
            .map_err(|e| AimError::invalid_setup(format!("{}: {e}", path.display())))?;
        record.validate()?;
        Ok(record)
    }

    /// Write the record as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> AimResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that the record can seed a battery.
    pub fn validate(&self) -> AimResult<()> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(AimError::invalid_setup(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(AimError::invalid_setup(format!(
                "sensitivity must be positive, got {}",
                self.sensitivity
            )));
        }
        if self.user.trim().is_empty() {
            return Err(AimError::invalid_setup("user must not be empty"));
        }
        if self.test_type.trim().is_empty() {
            return Err(AimError::invalid_setup("test_type must not be empty"));
        }
        Ok(())
    }

    /// in/360 at the base parameters.
    pub fn inches_per_360(&self) -> f64 {
        self.game.inches_per_360(self.dpi, self.sensitivity)
    }
}
