//! Configuration loader for closer
//!
//! Resolution order, later sources winning: built-in defaults, an optional
//! JSON file, then `CLOSER_*` environment variables.

use crate::config::ShutdownConfig;
use closer_core::{
    constants::{
        CLOSER_EXIT_CODE_VAR, CLOSER_FORCE_EXIT_VAR, CLOSER_LOGGING_VAR, CLOSER_NOTICE_VAR,
    },
    Error, Result, ResultExt,
};
use std::env::VarError;
use std::path::PathBuf;

/// Configuration loader that handles startup configuration
pub struct ConfigLoader {
    /// Optional JSON file to read before applying the environment
    file: Option<PathBuf>,
    /// Whether environment variables are consulted
    read_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            file: None,
            read_env: true,
        }
    }

    /// Read a JSON configuration file before the environment overlay
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Set whether `CLOSER_*` environment variables are applied
    pub fn read_env(mut self, read_env: bool) -> Self {
        self.read_env = read_env;
        self
    }

    /// Load and validate the configuration
    pub fn load(self) -> Result<ShutdownConfig> {
        let mut config: ShutdownConfig = match &self.file {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|e| Error::config_file(path.clone(), e))?;
                tracing::debug!(path = %path.display(), "loaded shutdown configuration file");
                serde_json::from_str(&contents)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => ShutdownConfig::default(),
        };

        if self.read_env {
            apply_env(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_env(config: &mut ShutdownConfig) -> Result<()> {
    if let Some(value) = env_value(CLOSER_LOGGING_VAR)? {
        config.logging = parse_bool(CLOSER_LOGGING_VAR, &value)?;
    }

    if let Some(value) = env_value(CLOSER_EXIT_CODE_VAR)? {
        config.exit_code = value.trim().parse().map_err(|_| {
            Error::configuration(format!(
                "{CLOSER_EXIT_CODE_VAR} must be an integer, got '{value}'"
            ))
        })?;
    }

    if let Some(value) = env_value(CLOSER_NOTICE_VAR)? {
        config.notice = value;
    }

    if let Some(value) = env_value(CLOSER_FORCE_EXIT_VAR)? {
        config.force_exit_on_repeat = parse_bool(CLOSER_FORCE_EXIT_VAR, &value)?;
    }

    Ok(())
}

fn env_value(variable: &str) -> Result<Option<String>> {
    match std::env::var(variable) {
        Ok(value) => {
            tracing::debug!(variable, "applying environment override");
            Ok(Some(value))
        }
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(Error::configuration(format!(
            "{variable} is not valid unicode"
        ))),
    }
}

pub(crate) fn parse_bool(variable: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::configuration(format!(
            "{variable} must be a boolean, got '{other}'"
        ))),
    }
}
