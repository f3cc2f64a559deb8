//! Configuration for batch feature extraction.

use crate::report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the session signal files
    pub data_dir: PathBuf,

    /// Directory holding the stimulus logs
    pub log_dir: PathBuf,

    /// Suffix that identifies session files (`<session><suffix>`)
    pub data_suffix: String,

    /// Extension of stimulus logs (`<session>.<ext>`)
    pub log_extension: String,

    /// Where the feature table is written
    pub output_path: PathBuf,

    /// Feature table format
    pub output_format: OutputFormat,

    /// Path for storing run statistics
    pub state_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let state_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("polygraph-features");

        Self {
            data_dir: PathBuf::from("data/result"),
            log_dir: PathBuf::from("data"),
            data_suffix: "_processed.json".to_string(),
            log_extension: "txt".to_string(),
            output_path: PathBuf::from("data/result/Signal_Analysis_Results.csv"),
            output_format: OutputFormat::Csv,
            state_path: state_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("polygraph-features")
            .join("config.json")
    }

    /// Where the statistics of the last run are kept.
    pub fn run_stats_path(&self) -> PathBuf {
        self.state_path.join("last_run.json")
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_suffix, "_processed.json");
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(config.log_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            Config::from_json(r#"{"log_dir": "logs", "output_format": "jsonl"}"#).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.output_format, OutputFormat::Jsonl);
        assert_eq!(config.log_extension, "txt");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Config::from_json("not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
