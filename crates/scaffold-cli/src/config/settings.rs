//! Configuration settings for the scaffold CLI

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Model settings
    pub model: ModelSettings,
    /// Retry settings
    pub retry: RetrySettings,
    /// Type-checker settings
    pub checker: CheckerSettings,
    /// Output file settings
    pub output: OutputSettings,
}

/// Model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    /// Model provider name (must be registered)
    pub provider: String,
    /// Model to use
    pub name: String,
    /// Maximum tokens per completion
    pub max_tokens: u32,
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum generate-or-fix attempts per artifact
    pub max_attempts: u32,
}

/// Type-checker settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckerSettings {
    /// Checker binary to run over generated source
    pub command: String,
    /// Arguments passed before the file path
    pub args: Vec<String>,
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// File name for the generated schema
    pub schema_file: String,
    /// File name for the generated API source
    pub api_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            retry: RetrySettings::default(),
            checker: CheckerSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            name: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            command: "tsc".to_string(),
            args: vec![
                "--noEmit".to_string(),
                "--pretty".to_string(),
                "false".to_string(),
            ],
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            schema_file: "schema.prisma".to_string(),
            api_file: "api.ts".to_string(),
        }
    }
}

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to find config directory
    NoConfigDir,
    /// Failed to read config file
    ReadError(std::io::Error),
    /// Failed to write config file
    WriteError(std::io::Error),
    /// Failed to parse TOML
    ParseError(toml::de::Error),
    /// Failed to serialize TOML
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Could not determine config directory"),
            ConfigError::ReadError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::WriteError(e) => write!(f, "Failed to write config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config file: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(e) => Some(e),
            ConfigError::WriteError(e) => Some(e),
            ConfigError::ParseError(e) => Some(e),
            ConfigError::SerializeError(e) => Some(e),
            ConfigError::NoConfigDir => None,
        }
    }
}

impl Settings {
    /// Path to the config file under the user config directory
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("scaffold").join("scaffold.toml"))
    }

    /// Load settings from the default location, writing defaults on first run
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from a specific path, writing defaults if absent
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        toml::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)
    }
}
