//! Configuration module for ec2-serial-console
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/ec2-serial-console/config.toml)
//! - User configuration (~/.ec2-serial-console.toml, then
//!   $XDG_CONFIG_HOME/ec2-serial-console/config.toml)
//! - Project configuration (./ec2-serial-console.toml)
//! - Environment variables
//!
//! Command-line flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "EC2_SERIAL_CONSOLE_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS client settings
    pub aws: AwsConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Result output settings
    pub output: OutputConfig,
}

/// AWS client settings. Unset values fall through to the SDK's default chains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region used when neither the module nor the command line names one
    pub region: Option<String>,

    /// Named profile from the shared AWS config/credentials files
    pub profile: Option<String>,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when no `-v` flag and no `RUST_LOG` is given
    pub level: String,

    /// Log line format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Result output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output in the Ansible module result shape
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Enable colored output; unset means enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl OutputConfig {
    /// Whether colored output is enabled
    pub fn color_enabled(&self) -> bool {
        self.color.unwrap_or(true)
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest precedence first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }
        if let Ok(env_config) = std::env::var(CONFIG_ENV) {
            return vec![PathBuf::from(env_config)];
        }

        let mut paths = vec![PathBuf::from("/etc/ec2-serial-console/config.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ec2-serial-console.toml"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ec2-serial-console/config.toml"));
        }

        paths.push(PathBuf::from("ec2-serial-console.toml"));

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; `other` wins wherever it differs from
    /// the defaults
    fn merge(&self, other: Config) -> Config {
        let defaults = Config::default();
        Config {
            aws: AwsConfig {
                region: other.aws.region.or_else(|| self.aws.region.clone()),
                profile: other.aws.profile.or_else(|| self.aws.profile.clone()),
            },
            logging: LoggingConfig {
                level: if other.logging.level != defaults.logging.level {
                    other.logging.level
                } else {
                    self.logging.level.clone()
                },
                format: if other.logging.format != defaults.logging.format {
                    other.logging.format
                } else {
                    self.logging.format
                },
            },
            output: OutputConfig {
                format: if other.output.format != defaults.output.format {
                    other.output.format
                } else {
                    self.output.format
                },
                color: other.output.color.or(self.output.color),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // EC2_SERIAL_CONSOLE_REGION
        if let Ok(region) = std::env::var("EC2_SERIAL_CONSOLE_REGION") {
            self.aws.region = Some(region);
        }

        // EC2_SERIAL_CONSOLE_PROFILE
        if let Ok(profile) = std::env::var("EC2_SERIAL_CONSOLE_PROFILE") {
            self.aws.profile = Some(profile);
        }

        // EC2_SERIAL_CONSOLE_LOG_LEVEL
        if let Ok(level) = std::env::var("EC2_SERIAL_CONSOLE_LOG_LEVEL") {
            self.logging.level = level;
        }

        // EC2_SERIAL_CONSOLE_LOG_FORMAT
        if let Ok(format) = std::env::var("EC2_SERIAL_CONSOLE_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "text" => self.logging.format = LogFormat::Text,
                _ => {}
            }
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.output.color = Some(false);
        }
    }

    /// Load from a specific file on top of the defaults
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        Config::default().merge_from_file(&path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aws.region, None);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.output.format, OutputFormat::Human);
        assert!(config.output.color_enabled());
    }

    #[test]
    fn test_config_merge() {
        let base = Config {
            aws: AwsConfig {
                region: Some("us-east-1".to_string()),
                profile: Some("base".to_string()),
            },
            ..Config::default()
        };
        let other = Config {
            aws: AwsConfig {
                region: Some("eu-central-1".to_string()),
                profile: None,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.aws.region.as_deref(), Some("eu-central-1"));
        assert_eq!(merged.aws.profile.as_deref(), Some("base"));
        assert_eq!(merged.logging.level, "debug");
        assert_eq!(merged.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_later_file_can_reenable_color() {
        let earlier = Config {
            output: OutputConfig {
                color: Some(false),
                ..OutputConfig::default()
            },
            ..Config::default()
        };
        let later = Config {
            output: OutputConfig {
                color: Some(true),
                ..OutputConfig::default()
            },
            ..Config::default()
        };

        let merged = Config::default().merge(earlier).merge(later);
        assert!(merged.output.color_enabled());
    }

    #[test]
    fn test_unset_color_keeps_earlier_value() {
        let earlier = Config {
            output: OutputConfig {
                color: Some(false),
                ..OutputConfig::default()
            },
            ..Config::default()
        };

        let merged = Config::default().merge(earlier).merge(Config::default());
        assert!(!merged.output.color_enabled());
    }

    #[test]
    fn test_explicit_path_short_circuits_search() {
        let explicit = PathBuf::from("/tmp/custom.toml");
        assert_eq!(Config::get_config_paths(Some(&explicit)), vec![explicit]);
    }
}
