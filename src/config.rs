//! Configuration management module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::location::PositionRequest;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// HRMS backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server URL (e.g., "https://hr.example.com").
    pub base_url: String,
    /// Overall HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// Position acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Request the most precise fix available (default: true).
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
    /// Acquisition deadline in seconds (default: 15).
    #[serde(default = "default_location_timeout_secs")]
    pub timeout_secs: u64,
    /// Oldest cached fix the provider may serve, in seconds (default: 5).
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    /// Fixed coordinates for installs without a live provider
    /// (kiosks, terminals). Both must be set together.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_high_accuracy() -> bool {
    true
}

fn default_location_timeout_secs() -> u64 {
    15
}

fn default_max_age_secs() -> u64 {
    5
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Also write daily-rolling log files (default: false).
    #[serde(default)]
    pub file_enabled: bool,
    /// Log file directory; platform data dir when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Get config file path under the platform config directory.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "geo-attendance")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Default directory for rolling log files.
    pub fn default_log_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "geo-attendance")
            .map(|dirs| dirs.data_local_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.base_url.is_empty() && !self.server.base_url.starts_with("http") {
            return Err(ConfigError::Validation(
                "Server URL must start with http:// or https://".to_string(),
            ));
        }
        if self.server.timeout_secs < 5 {
            return Err(ConfigError::Validation(
                "HTTP timeout must be at least 5 seconds".to_string(),
            ));
        }
        if self.location.timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "Location timeout must be at least 1 second".to_string(),
            ));
        }
        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(ConfigError::Validation(
                        "Latitude must be between -90 and 90".to_string(),
                    ));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(ConfigError::Validation(
                        "Longitude must be between -180 and 180".to_string(),
                    ));
                }
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Validation(
                    "Latitude and longitude must be set together".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl LocationConfig {
    /// Acquisition options for the position provider.
    pub fn position_request(&self) -> PositionRequest {
        PositionRequest {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_secs(self.timeout_secs),
            max_age: Duration::from_secs(self.max_age_secs),
        }
    }

    /// Fixed coordinates, when both are configured.
    pub fn fixed_coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: default_high_accuracy(),
            timeout_secs: default_location_timeout_secs(),
            max_age_secs: default_max_age_secs(),
            latitude: None,
            longitude: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_server_url() {
        let mut config = AppConfig::default();
        config.server.base_url = "ftp://invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_http_timeout_bound() {
        let mut config = AppConfig::default();
        config.server.timeout_secs = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_coordinates_must_pair() {
        let mut config = AppConfig::default();
        config.location.latitude = Some(12.9716);
        assert!(config.validate().is_err());

        config.location.longitude = Some(77.5946);
        assert!(config.validate().is_ok());

        config.location.latitude = Some(120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_position_request_from_config() {
        let config = LocationConfig::default();
        let request = config.position_request();
        assert!(request.high_accuracy);
        assert_eq!(request.timeout, Duration::from_secs(15));
        assert_eq!(request.max_age, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = AppConfig::try_load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, ConfigLoadResult::Missing));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            "[server]\nbase_url = \"https://hr.example.com\"\n",
        )
        .unwrap();
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.location.timeout_secs, 15);
        assert!(!config.log.file_enabled);
    }
}
