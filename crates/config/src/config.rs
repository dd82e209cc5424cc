//! Shutdown configuration shared by the registry and the signal listeners.

use closer_core::{
    constants::{DEFAULT_EXIT_CODE, DEFAULT_SIGNAL_NOTICE, MAX_EXIT_CODE, MIN_EXIT_CODE},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Settings that control console output and process termination.
///
/// The struct is plain data: it is `Clone + Send + Sync` and is copied into
/// each registry at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Print each action's label (and the signal notice) to the console
    pub logging: bool,

    /// Process exit status after a signal-triggered drain
    pub exit_code: i32,

    /// Line printed once when a termination signal arrives
    pub notice: String,

    /// Exit immediately on a second signal received mid-drain
    pub force_exit_on_repeat: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            logging: true,
            exit_code: DEFAULT_EXIT_CODE,
            notice: DEFAULT_SIGNAL_NOTICE.to_string(),
            force_exit_on_repeat: true,
        }
    }
}

impl ShutdownConfig {
    /// Defaults overlaid with any `CLOSER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        crate::ConfigLoader::new().load()
    }

    /// Reject settings the signal listener cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_EXIT_CODE..=MAX_EXIT_CODE).contains(&self.exit_code) {
            return Err(Error::configuration(format!(
                "exit code must be between {MIN_EXIT_CODE} and {MAX_EXIT_CODE}, got {}",
                self.exit_code
            )));
        }
        Ok(())
    }

    /// Builder-style toggle for console output
    #[must_use]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Builder-style override for the exit status
    #[must_use]
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Builder-style override for the signal notice
    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }
}
