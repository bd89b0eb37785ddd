//! Valuation run configuration.
//!
//! Loads run settings from TOML and environment variables. The engine never
//! reads configuration itself: a [`ValuationConfig`] produces the
//! [`ObservationMode`] handed to the engine builder, the [`ProgressLog`]
//! registered on it, and the [`BuildOptions`] handed to each cube build.

use crate::engine::BuildOptions;
use crate::observation::ObservationMode;
use crate::progress::ProgressLog;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable overriding the observation mode.
pub const ENV_OBSERVATION_MODE: &str = "PRICER_OBSERVATION_MODE";
/// Environment variable overriding sticky close-out dates.
pub const ENV_MPOR_STICKY_DATE: &str = "PRICER_MPOR_STICKY_DATE";
/// Environment variable overriding dry-run mode.
pub const ENV_DRY_RUN: &str = "PRICER_DRY_RUN";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown observation mode name.
    #[error(transparent)]
    InvalidObservationMode(#[from] crate::observation::ParseObservationModeError),

    /// Boolean setting that is neither true nor false.
    #[error("Invalid boolean for {key}: {value}. Must be true or false")]
    InvalidBool {
        /// Setting name
        key: &'static str,
        /// Rejected value
        value: String,
    },

    /// Progress logging needs at least one message.
    #[error("Invalid progress message count: {0}. Must be > 0")]
    InvalidProgressMessages(usize),

    /// Configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),
}

/// Settings for a portfolio revaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// How market changes reach instruments and models
    pub observation_mode: ObservationMode,
    /// Keep the valuation date fixed on close-out dates
    pub mpor_sticky_date: bool,
    /// Value one sample and fill the rest from time-zero values
    pub dry_run: bool,
    /// Maximum number of progress lines logged per cube build
    pub progress_messages: usize,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            observation_mode: ObservationMode::Standard,
            mpor_sticky_date: false,
            dry_run: false,
            progress_messages: 10,
        }
    }
}

impl ValuationConfig {
    /// Create a new ValuationConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_simulation::{ObservationMode, ValuationConfig};
    ///
    /// let config = ValuationConfig::from_toml_str(
    ///     r#"
    ///     observation_mode = "unregister"
    ///     mpor_sticky_date = true
    ///     "#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.observation_mode, ObservationMode::Unregister);
    /// assert!(config.mpor_sticky_date);
    /// assert!(!config.dry_run);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ValuationConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides settings from a variable lookup, then validates.
    ///
    /// Unset variables leave the current value untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_OBSERVATION_MODE) {
            self.observation_mode = ObservationMode::from_str(&mode)?;
        }
        if let Some(value) = lookup(ENV_MPOR_STICKY_DATE) {
            self.mpor_sticky_date = parse_bool(ENV_MPOR_STICKY_DATE, &value)?;
        }
        if let Some(value) = lookup(ENV_DRY_RUN) {
            self.dry_run = parse_bool(ENV_DRY_RUN, &value)?;
        }
        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_messages == 0 {
            return Err(ConfigError::InvalidProgressMessages(self.progress_messages));
        }
        Ok(())
    }

    /// Per-build options derived from this configuration.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            mpor_sticky_date: self.mpor_sticky_date,
            dry_run: self.dry_run,
        }
    }

    /// Progress log for the named task, capped at `progress_messages`
    /// lines per build.
    pub fn progress_log(&self, name: impl Into<String>) -> ProgressLog {
        ProgressLog::new(name, self.progress_messages)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}
