//! Code generation configuration.
//!
//! Controls the backend optimisation level, float relaxations and the host
//! ISA extension flags that are passed through to the native target.
//!
//! ```
//! use gjit::{CodegenConfig, OptLevel};
//!
//! let config = CodegenConfig::from_toml_str(r#"
//!     opt_level = "speed"
//!     isa_flags = ["has_sse41"]
//! "#).unwrap();
//!
//! assert_eq!(config.opt_level, OptLevel::Speed);
//! assert!(config.fast_math);
//! ```


use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Backend optimisation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    None,
    Speed,
    /// Highest level the backend offers.
    #[default]
    SpeedAndSize,
}

impl OptLevel {
    /// Value of the backend `opt_level` setting.
    pub fn as_setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

/// Options applied to every program compiled by a device.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CodegenConfig {
    #[serde(default)]
    pub opt_level: OptLevel,

    /// Skip NaN canonicalisation in float code.
    #[serde(default = "default_true")]
    pub fast_math: bool,

    /// Run the IR verifier on every function.
    #[serde(default)]
    pub enable_verifier: bool,

    /// ISA extension flags enabled on top of host detection (e.g. `has_avx`).
    #[serde(default)]
    pub isa_flags: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::default(),
            fast_math: true,
            enable_verifier: false,
            isa_flags: Vec::new(),
        }
    }
}

impl CodegenConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the optimisation level.
    pub fn with_opt_level(mut self, opt_level: OptLevel) -> Self {
        self.opt_level = opt_level;
        self
    }

    /// Adds an ISA extension flag.
    pub fn with_isa_flag(mut self, flag: impl Into<String>) -> Self {
        self.isa_flags.push(flag.into());
        self
    }

    /// Enables or disables the IR verifier.
    pub fn with_verifier(mut self, enable: bool) -> Self {
        self.enable_verifier = enable;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(flag) = self.isa_flags.iter().find(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("empty ISA flag {flag:?}")));
        }
        Ok(())
    }
}
