//! Sensitivity to distance-per-360 conversion.
//!
//! `in/360 = K / (dpi × sensitivity)` where `K` is the number of mouse counts
//! a game needs for a full turn at sensitivity 1.0 (`360 / yaw`).

use std::fmt;

use serde::{Deserialize, Serialize};

const CM_PER_INCH: f64 = 2.54;

/// Per-game counts-per-360 constants.
///
/// | Profile | Yaw (°/count) | K |
/// |---|---|---|
/// | CS2 | 0.022 | 16363.6 |
/// | Apex Legends | 0.022 | 16363.6 |
/// | Valorant | 0.07 | 5142.9 |
/// | Overwatch 2 | 0.0066 | 54545.5 |
/// | Generic | n/a | 10080 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameProfile {
    Cs2,
    Apex,
    Valorant,
    Overwatch2,
    /// Comparison unit used when no game is selected.
    #[default]
    Generic,
    /// Caller-supplied counts-per-360.
    Custom(f64),
}

impl GameProfile {
    pub const ALL: [GameProfile; 5] = [
        GameProfile::Cs2,
        GameProfile::Apex,
        GameProfile::Valorant,
        GameProfile::Overwatch2,
        GameProfile::Generic,
    ];

    /// Mouse counts per 360° at sensitivity 1.0.
    pub fn counts_per_360(&self) -> f64 {
        match self {
            GameProfile::Cs2 | GameProfile::Apex => 360.0 / 0.022,
            GameProfile::Valorant => 360.0 / 0.07,
            GameProfile::Overwatch2 => 360.0 / 0.0066,
            GameProfile::Generic => 10080.0,
            GameProfile::Custom(k) => *k,
        }
    }

    /// Parse a profile name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<GameProfile> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cs2" | "csgo" | "counter-strike" => Some(GameProfile::Cs2),
            "apex" | "apex-legends" => Some(GameProfile::Apex),
            "valorant" => Some(GameProfile::Valorant),
            "overwatch" | "overwatch2" | "ow2" => Some(GameProfile::Overwatch2),
            "generic" => Some(GameProfile::Generic),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|k| k.is_finite() && *k > 0.0)
                .map(GameProfile::Custom),
        }
    }

    pub fn inches_per_360(&self, dpi: f64, sensitivity: f64) -> f64 {
        inches_per_360(dpi, sensitivity, self.counts_per_360())
    }
}

impl fmt::Display for GameProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameProfile::Cs2 => write!(f, "cs2"),
            GameProfile::Apex => write!(f, "apex"),
            GameProfile::Valorant => write!(f, "valorant"),
            GameProfile::Overwatch2 => write!(f, "overwatch2"),
            GameProfile::Generic => write!(f, "generic"),
            GameProfile::Custom(k) => write!(f, "custom({k})"),
        }
    }
}

/// Physical inches of mouse travel for a full in-game turn.
///
/// Returns 0 when `dpi × sensitivity` is not a positive finite number.
pub fn inches_per_360(dpi: f64, sensitivity: f64, counts_per_360: f64) -> f64 {
    let denominator = dpi * sensitivity;
    if !(denominator.is_finite() && denominator > 0.0) || !counts_per_360.is_finite() {
        return 0.0;
    }
    counts_per_360 / denominator
}

/// Centimetres of mouse travel for a full in-game turn.
pub fn cm_per_360(dpi: f64, sensitivity: f64, counts_per_360: f64) -> f64 {
    inches_per_360(dpi, sensitivity, counts_per_360) * CM_PER_INCH
}

/// Sensitivity that yields `inches` per 360° at the given DPI.
pub fn sensitivity_for_inches(inches: f64, dpi: f64, counts_per_360: f64) -> f64 {
    inches_per_360(dpi, inches, counts_per_360)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_conversion() {
        assert!((inches_per_360(800.0, 1.0, 10080.0) - 12.6).abs() < 1e-12);
        assert!((GameProfile::Generic.inches_per_360(800.0, 1.0) - 12.6).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_recovers_sensitivity() {
        for &(dpi, sens) in &[(400.0, 2.0), (800.0, 1.0), (1600.0, 0.37), (3200.0, 0.11)] {
            for profile in GameProfile::ALL {
                let k = profile.counts_per_360();
                let inches = inches_per_360(dpi, sens, k);
                let recovered = sensitivity_for_inches(inches, dpi, k);
                assert!(
                    (recovered - sens).abs() < 1e-9,
                    "{profile}: {recovered} != {sens}"
                );
            }
        }
    }

    #[test]
    fn test_degenerate_inputs_yield_zero() {
        assert_eq!(inches_per_360(0.0, 1.0, 10080.0), 0.0);
        assert_eq!(inches_per_360(800.0, -1.0, 10080.0), 0.0);
        assert_eq!(inches_per_360(f64::NAN, 1.0, 10080.0), 0.0);
        assert_eq!(sensitivity_for_inches(0.0, 800.0, 10080.0), 0.0);
    }

    #[test]
    fn test_cm_conversion() {
        assert!((cm_per_360(800.0, 1.0, 10080.0) - 32.004).abs() < 1e-9);
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(GameProfile::from_name("CS2"), Some(GameProfile::Cs2));
        assert_eq!(GameProfile::from_name("ow2"), Some(GameProfile::Overwatch2));
        assert_eq!(
            GameProfile::from_name("12000"),
            Some(GameProfile::Custom(12000.0))
        );
        assert_eq!(GameProfile::from_name("-3"), None);
        assert_eq!(GameProfile::from_name("quake"), None);
    }
}
