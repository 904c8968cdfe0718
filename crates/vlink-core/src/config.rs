//! # Configuration System
//!
//! YAML-based configuration for vlink runs:
//!
//! - Code settings (systematic bit, Viterbi decoding depth)
//! - Channel settings (bit error rate, RNG seed)
//! - Input and output file paths
//! - Logging
//! - Named channel profiles
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `VLINK_CONFIG` environment variable
//! 2. `./vlink.yaml` (current directory)
//! 3. `~/.config/vlink/config.yaml` (user config)
//! 4. `/etc/vlink/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! code:
//!   layout: systematic
//!   decoding_depth: 48
//!
//! channel:
//!   error_rate: 50      # parts per 10 000
//!   seed: 7
//!
//! paths:
//!   input_image: "assets/bee100.bmp"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fec::{ConvolutionalEncoder, OutputLayout, DEFAULT_DECODING_DEPTH, IS95_DELAY};
use crate::observe::LogConfig;

/// Denominator of the channel error rate (parts per ten thousand).
pub const ERROR_RATE_SCALE: u32 = 10_000;

/// Error type for configuration operations.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file or profile not found
    NotFound(String),
    /// Failed to read or write configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Convolutional code configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    /// Symbol layout (parity or systematic)
    pub layout: OutputLayout,
    /// Viterbi window length in symbols
    pub decoding_depth: usize,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            layout: OutputLayout::Systematic,
            decoding_depth: DEFAULT_DECODING_DEPTH,
        }
    }
}

impl CodeConfig {
    /// Encoder for this configuration.
    pub fn encoder(&self) -> ConvolutionalEncoder {
        ConvolutionalEncoder::new(self.layout)
    }
}

/// Noisy channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Bit flip probability in parts per 10 000
    pub error_rate: u32,
    /// RNG seed (None = OS entropy)
    pub seed: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            error_rate: 5,
            seed: None,
        }
    }
}

impl ChannelConfig {
    /// Bit flip probability as a fraction.
    pub fn flip_probability(&self) -> f64 {
        self.error_rate as f64 / ERROR_RATE_SCALE as f64
    }
}

/// Input and output files of a link run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Source BMP image
    pub input_image: PathBuf,
    /// Uncoded signal as '0'/'1' text
    pub plain_text: PathBuf,
    /// Image rebuilt from the uncoded signal
    pub plain_image: PathBuf,
    /// Coded (and noisy) signal as '0'/'1' text
    pub coded_text: PathBuf,
    /// Image rebuilt from the Viterbi-decoded signal
    pub decoded_image: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            input_image: PathBuf::from("assets/bee100.bmp"),
            plain_text: PathBuf::from("assets/bee100.txt"),
            plain_image: PathBuf::from("assets/out100.bmp"),
            coded_text: PathBuf::from("assets/outIS95.txt"),
            decoded_image: PathBuf::from("assets/outIS95.bmp"),
        }
    }
}

/// Complete vlink configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Configuration version
    pub version: String,
    /// Code configuration
    pub code: CodeConfig,
    /// Channel configuration
    pub channel: ChannelConfig,
    /// File paths
    pub paths: PathConfig,
    /// Logging configuration
    pub logging: LogConfig,
    /// Channel profiles (name -> config)
    pub profiles: HashMap<String, ChannelConfig>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            code: CodeConfig::default(),
            channel: ChannelConfig::default(),
            paths: PathConfig::default(),
            logging: LogConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

impl LinkConfig {
    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `VLINK_CONFIG` environment variable
    /// 2. `./vlink.yaml`
    /// 3. `~/.config/vlink/config.yaml`
    /// 4. `/etc/vlink/config.yaml`
    ///
    /// Returns default config if no file is found. A `VLINK_CONFIG` naming
    /// a missing file is a [`ConfigError::NotFound`].
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("VLINK_CONFIG") {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "VLINK_CONFIG: {}",
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Apply a channel profile by name.
    pub fn with_profile(&self, name: &str) -> Result<Self, ConfigError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(format!("profile '{}' not found", name)))?;

        let mut config = self.clone();
        config.channel = profile.clone();
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./vlink.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "vlink") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/vlink/config.yaml"));

        paths
    }

    /// Validate the configuration.
    ///
    /// Decoding depths below the register width are accepted here; the
    /// decoder raises them with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.code.decoding_depth == 0 {
            return Err(ConfigError::ValidationError(
                "decoding_depth must be > 0".to_string(),
            ));
        }

        if self.channel.error_rate > ERROR_RATE_SCALE {
            return Err(ConfigError::ValidationError(format!(
                "error_rate must be 0-{}",
                ERROR_RATE_SCALE
            )));
        }

        for (name, profile) in &self.profiles {
            if profile.error_rate > ERROR_RATE_SCALE {
                return Err(ConfigError::ValidationError(format!(
                    "profile '{}': error_rate must be 0-{}",
                    name, ERROR_RATE_SCALE
                )));
            }
        }

        if self.code.decoding_depth < IS95_DELAY {
            tracing::warn!(
                depth = self.code.decoding_depth,
                "decoding_depth below {} will be raised",
                IS95_DELAY
            );
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            profiles: {
                let mut profiles = HashMap::new();
                profiles.insert(
                    "clean".to_string(),
                    ChannelConfig {
                        error_rate: 0,
                        seed: None,
                    },
                );
                profiles.insert(
                    "harsh".to_string(),
                    ChannelConfig {
                        error_rate: 200,
                        seed: Some(1),
                    },
                );
                profiles
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
