//! Configuration for the DNA-Lang toolchain
//!
//! Defaults, TOML files and environment overrides for logging, the parser
//! and the caller-side evolution loop.

use crate::dsl::parser::ParseOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("IO error reading config file: {message}")]
    IoError { message: String },

    #[error("Configuration parsing error: {message}")]
    ParseError { message: String },
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub parser: ParserConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                reason: format!("unknown format '{}'", s),
            }),
        }
    }
}

/// Evolution engine and run-loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Generation cap for callers that loop `evolve_step`.
    pub max_generations: u64,
    /// Stop the loop once the consciousness target is reached.
    pub stop_on_target: bool,
    /// Extra metrics merged into every step's context. Organism state wins
    /// on name clashes.
    pub static_metrics: BTreeMap<String, f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_generations: 100,
            stop_on_target: true,
            static_metrics: BTreeMap::new(),
        }
    }
}

/// Parser configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reject duplicate gene names and out-of-range expression levels.
    pub strict: bool,
}

impl From<&ParserConfig> for ParseOptions {
    fn from(config: &ParserConfig) -> Self {
        ParseOptions {
            strict: config.strict,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Override fields from `DNALANG_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = env::var("DNALANG_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("DNALANG_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        if let Ok(max) = env::var("DNALANG_MAX_GENERATIONS") {
            self.engine.max_generations = max.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DNALANG_MAX_GENERATIONS".to_string(),
                reason: "Invalid generation count".to_string(),
            })?;
        }

        if let Ok(strict) = env::var("DNALANG_STRICT") {
            self.parser.strict = matches!(strict.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                reason: format!("Must be one of: {}", valid_levels.join(", ")),
            });
        }

        if self.engine.max_generations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.max_generations".to_string(),
                reason: "Generation cap must be > 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::from(&self.parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.engine.max_generations, 100);
        assert!(config.engine.stop_on_target);
        assert!(config.engine.static_metrics.is_empty());
        assert!(!config.parser.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        env::set_var("DNALANG_LOG_LEVEL", "debug");
        env::set_var("DNALANG_LOG_FORMAT", "json");
        env::set_var("DNALANG_MAX_GENERATIONS", "25");
        env::set_var("DNALANG_STRICT", "true");

        let config = Config::from_env().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.engine.max_generations, 25);
        assert!(config.parse_options().strict);

        // Cleanup
        env::remove_var("DNALANG_LOG_LEVEL");
        env::remove_var("DNALANG_LOG_FORMAT");
        env::remove_var("DNALANG_MAX_GENERATIONS");
        env::remove_var("DNALANG_STRICT");
    }

    #[test]
    #[serial]
    fn test_config_from_env_invalid_generations() {
        env::set_var("DNALANG_MAX_GENERATIONS", "many");
        let result = Config::from_env();
        env::remove_var("DNALANG_MAX_GENERATIONS");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "DNALANG_MAX_GENERATIONS"
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "warn"
format = "compact"

[engine]
max_generations = 12

[engine.static_metrics]
load = 0.4
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.engine.max_generations, 12);
        assert!(config.engine.stop_on_target);
        assert_eq!(config.engine.static_metrics.get("load"), Some(&0.4));
        assert!(!config.parser.strict);
    }

    #[test]
    fn test_config_from_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/dnalang.toml"),
            Err(ConfigError::IoError { .. })
        ));
    }

    #[test]
    fn test_config_from_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine\nmax_generations = ").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_generation_cap() {
        let mut config = Config::default();
        config.engine.max_generations = 0;
        assert!(config.validate().is_err());
    }
}
