//! Outcome of a single pass over the registered cleanup actions.

use closer_core::{Error, Result};
use std::any::Any;

/// A cleanup action that panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub label: String,
    pub message: String,
}

/// What happened during one `run_all` or `drain` pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Labels of every invoked action, in run order
    pub executed: Vec<String>,
    /// Actions that panicked; each also appears in `executed`
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            executed: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_success(&mut self, label: String) {
        self.executed.push(label);
    }

    pub(crate) fn record_failure(&mut self, label: String, message: String) {
        self.failures.push(CleanupFailure {
            label: label.clone(),
            message,
        });
        self.executed.push(label);
    }

    /// True when no action panicked
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse the report into a single aggregate error
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }

        let details = self
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.label, f.message))
            .collect();
        Err(Error::cleanup_failed(self.executed.len(), details))
    }
}

/// Best-effort extraction of a panic payload's message
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "cleanup action panicked".to_string()
    }
}
