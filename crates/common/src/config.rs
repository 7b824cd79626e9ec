//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Location of the setup record written by the setup screen.
    pub setup_path: PathBuf,

    /// Result submission endpoint.
    pub api: ApiConfig,

    /// Default battery parameters.
    pub battery: BatteryDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Result submission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the results backend (e.g., "https://aimforge.example").
    pub base_url: String,

    /// Whether results are posted at all.
    pub enabled: bool,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Default battery parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryDefaults {
    /// Multipliers applied to the base sensitivity, one run each.
    pub sensitivity_multipliers: Vec<f64>,

    /// Multipliers applied to the base DPI, paired with the sensitivity
    /// multipliers by index. Missing entries default to 1.0.
    #[serde(default)]
    pub dpi_multipliers: Vec<f64>,

    /// Countdown before each run starts.
    pub countdown_ms: u64,

    /// Pause between runs.
    pub pause_ms: u64,

    /// Target frame rate of the run loop.
    pub frame_hz: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "aimforge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            setup_path: default_setup_path(),
            api: ApiConfig::default(),
            battery: BatteryDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            enabled: false,
            timeout_secs: 10,
        }
    }
}

impl Default for BatteryDefaults {
    fn default() -> Self {
        Self {
            sensitivity_multipliers: vec![0.8, 0.9, 1.0, 1.1, 1.2],
            dpi_multipliers: Vec::new(),
            countdown_ms: 3000,
            pause_ms: 2000,
            frame_hz: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl BatteryDefaults {
    /// `(dpi_multiplier, sensitivity_multiplier)` pairs in battery order.
    pub fn multiplier_pairs(&self) -> Vec<(f64, f64)> {
        self.sensitivity_multipliers
            .iter()
            .enumerate()
            .map(|(i, sens)| {
                let dpi = self.dpi_multipliers.get(i).copied().unwrap_or(1.0);
                (dpi, *sens)
            })
            .collect()
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("aimforge").join("config.json")
}

/// Default setup record location.
pub fn default_setup_path() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("aimforge").join("setup.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_battery_has_five_configurations() {
        let defaults = BatteryDefaults::default();
        let pairs = defaults.multiplier_pairs();
        assert_eq!(pairs.len(), 5);
        assert!(pairs.iter().all(|(dpi, _)| *dpi == 1.0));
        assert_eq!(pairs[2], (1.0, 1.0));
    }

    #[test]
    fn test_dpi_multipliers_pair_by_index() {
        let defaults = BatteryDefaults {
            sensitivity_multipliers: vec![1.0, 1.0, 1.0],
            dpi_multipliers: vec![0.5, 2.0],
            ..Default::default()
        };
        assert_eq!(
            defaults.multiplier_pairs(),
            vec![(0.5, 1.0), (2.0, 1.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn test_config_parses_without_dpi_multipliers() {
        let raw = r#"{
            "setup_path": "/tmp/setup.json",
            "api": {"base_url": "http://localhost:3000", "enabled": true, "timeout_secs": 5},
            "battery": {"sensitivity_multipliers": [1.0], "countdown_ms": 0, "pause_ms": 0, "frame_hz": 120},
            "logging": {"level": "debug", "json": false, "file": null}
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.api.enabled);
        assert!(config.battery.dpi_multipliers.is_empty());
        assert_eq!(config.battery.frame_hz, 120);
    }
}
