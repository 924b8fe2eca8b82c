//! # Configuration Management Module
//!
//! Persistent application settings stored in platform-appropriate locations.
//! Handles loading, saving, and providing defaults for configuration options.
//!
//! ## Settings
//! - `enable_autoconnect`: Connect to the first Watto found at startup
//! - `history_capacity`: Samples kept per series (200..=1000)
//! - `default_stride`: Decimation stride applied at startup (1, 10 or 100)
//! - `histogram_bins` / `histogram_exponent`: Power-law histogram shape
//! - `battery_capacity_mah`: Capacity used for the battery-life estimate
//! - `scan_duration_secs`: How long a discovery scan runs (1..=60)
//!
//! ## Storage Location
//! - macOS: ~/Library/Application Support/watto-monitor/config.toml
//! - Linux: ~/.config/watto-monitor/config.toml
//! - Windows: %APPDATA%\watto-monitor\config.toml

use crate::decimation::Stride;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_HISTORY_CAPACITY: usize = 200;
pub const MAX_HISTORY_CAPACITY: usize = 1000;
pub const MIN_SCAN_SECS: u64 = 1;
pub const MAX_SCAN_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub enable_autoconnect: bool,
    pub history_capacity: usize,
    pub default_stride: Stride,
    pub histogram_bins: usize,
    pub histogram_exponent: f32,
    pub battery_capacity_mah: f32,
    pub scan_duration_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_autoconnect: true,
            history_capacity: MIN_HISTORY_CAPACITY,
            default_stride: Stride::One,
            histogram_bins: 20,
            histogram_exponent: 2.0,
            battery_capacity_mah: 1000.0,
            scan_duration_secs: 5,
        }
    }
}

/// Clamp a requested history length to the supported window
pub fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY)
}

impl Config {
    /// Get the path to the config file
    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("watto-monitor")
            .join("config.toml")
    }

    /// Load config from the platform location, creating a default file if missing
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents).map_err(ConfigError::ParseFailed)?;
                Ok(config.sanitized())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, writing defaults", path.display());
                let config = Self::default();
                config.save_to(path)?;
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadFailed(e)),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)?;
        fs::write(path, toml_string).map_err(ConfigError::WriteFailed)?;

        Ok(())
    }

    /// Bring hand-edited values back into their valid ranges
    fn sanitized(mut self) -> Self {
        let capacity = clamp_capacity(self.history_capacity);
        if capacity != self.history_capacity {
            log::warn!(
                "history_capacity {} out of range, using {}",
                self.history_capacity,
                capacity
            );
            self.history_capacity = capacity;
        }
        let scan = self.scan_duration_secs.clamp(MIN_SCAN_SECS, MAX_SCAN_SECS);
        if scan != self.scan_duration_secs {
            log::warn!(
                "scan_duration_secs {} out of range, using {}",
                self.scan_duration_secs,
                scan
            );
            self.scan_duration_secs = scan;
        }
        if self.histogram_bins == 0 {
            self.histogram_bins = Config::default().histogram_bins;
        }
        if !(self.histogram_exponent.is_finite() && self.histogram_exponent > 0.0) {
            log::warn!("histogram_exponent must be positive, using linear bins");
            self.histogram_exponent = 1.0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.enable_autoconnect);
        assert_eq!(config.history_capacity, 200);
        assert_eq!(config.default_stride, Stride::One);
        assert_eq!(config.histogram_bins, 20);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            enable_autoconnect: false,
            default_stride: Stride::Hundred,
            ..Config::default()
        };

        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        assert!(toml_str.contains("enable_autoconnect = false"));
        assert!(toml_str.contains("default_stride = 100"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
            history_capacity = 500
        "#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.history_capacity, 500);
        assert!(config.enable_autoconnect);
        assert_eq!(config.scan_duration_secs, 5);
    }

    #[test]
    fn test_invalid_stride_rejected() {
        let result: Result<Config, _> = toml::from_str("default_stride = 7");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let config = Config {
            history_capacity: 750,
            default_stride: Stride::Ten,
            battery_capacity_mah: 2500.0,
            ..Config::default()
        };
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "history_capacity = 5000\nhistogram_bins = 0\nhistogram_exponent = -3.0\n",
        )
        .expect("write");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.history_capacity, MAX_HISTORY_CAPACITY);
        assert_eq!(loaded.histogram_bins, 20);
        assert_eq!(loaded.histogram_exponent, 1.0);
    }

    #[test]
    fn test_scan_duration_is_clamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        fs::write(&path, "scan_duration_secs = 0\n").expect("write");
        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.scan_duration_secs, MIN_SCAN_SECS);

        fs::write(&path, "scan_duration_secs = 9223372036854775807\n").expect("write");
        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.scan_duration_secs, MAX_SCAN_SECS);
        assert_eq!(loaded.scan_duration_secs.saturating_mul(2), 120);
    }

    #[test]
    fn test_parse_error_surfaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_capacity = \"lots\"").expect("write");

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
