//! Registry of labelled cleanup actions run in FILO order.
//!
//! The registry is an explicit object shared through `Arc`; there is no
//! process-global instance. Actions are kept newest-first, so iterating the
//! list front to back releases resources in the reverse order they were
//! acquired, the same way nested scopes would.

use crate::report::{panic_message, CleanupReport};
use closer_config::ShutdownConfig;
use closer_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type CleanupFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// A registered action and the label printed before it runs
#[derive(Clone)]
struct CleanupEntry {
    label: String,
    cleanup_fn: CleanupFn,
}

/// Registry for cleanup actions that must run when the process shuts down
pub struct ShutdownRegistry {
    entries: Mutex<VecDeque<CleanupEntry>>,
    logging: AtomicBool,
    // Shared with signal-hook's conditional shutdown, hence the Arc.
    pub(crate) draining: Arc<AtomicBool>,
    pub(crate) armed: AtomicBool,
    output: Mutex<Box<dyn Write + Send>>,
    config: ShutdownConfig,
}

impl ShutdownRegistry {
    /// Create an empty registry with logging enabled, printing to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ShutdownConfig::default())
    }

    /// Create an empty registry printing to stdout
    #[must_use]
    pub fn with_config(config: ShutdownConfig) -> Self {
        Self::with_output(config, std::io::stdout())
    }

    /// Create an empty registry printing labels to `output`
    pub fn with_output(config: ShutdownConfig, output: impl Write + Send + 'static) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(16)),
            logging: AtomicBool::new(config.logging),
            draining: Arc::new(AtomicBool::new(false)),
            armed: AtomicBool::new(false),
            output: Mutex::new(Box::new(output)),
            config,
        }
    }

    /// Register an action to run at shutdown.
    ///
    /// The most recently registered action runs first. Labels are not
    /// validated: empty and duplicate labels are fine. After the final drain
    /// has started the action is dropped with a warning; use
    /// [`try_register`](Self::try_register) to observe that case.
    pub fn register<F>(&self, label: impl Into<String>, cleanup_fn: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Err(e) = self.try_register(label, cleanup_fn) {
            tracing::warn!(error = %e, "cleanup action rejected");
        }
    }

    /// Register an action, failing once the final drain has started
    pub fn try_register<F>(&self, label: impl Into<String>, cleanup_fn: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let label = label.into();
        let mut entries = self.entries.lock();

        // Checked under the lock so drain() cannot take the list in between.
        if self.draining.load(Ordering::Acquire) {
            return Err(Error::drained(label));
        }

        tracing::trace!(label = %label, position = entries.len(), "registered cleanup action");
        entries.push_front(CleanupEntry {
            label,
            cleanup_fn: Arc::new(cleanup_fn),
        });
        Ok(())
    }

    /// Run every registered action now, most recent first.
    ///
    /// The registry is left untouched, so a second call runs everything
    /// again. A panicking action is recorded in the returned report and the
    /// remaining actions still run.
    pub fn run_all(&self) -> CleanupReport {
        // Snapshot so actions may call register() without deadlocking.
        let snapshot: Vec<CleanupEntry> = self.entries.lock().iter().cloned().collect();
        self.run_entries(snapshot)
    }

    /// Take every registered action out of the registry and run it, once.
    ///
    /// Only the first call across all threads and signal listeners does any
    /// work; later calls return `None`. Registrations made after the drain
    /// started are rejected.
    pub fn drain(&self) -> Option<CleanupReport> {
        self.drain_then(|| {})
    }

    /// Drain after a termination signal: the notice is printed only by the
    /// caller that wins the drain.
    pub(crate) fn drain_announced(&self) -> Option<CleanupReport> {
        self.drain_then(|| self.announce())
    }

    fn drain_then(&self, on_start: impl FnOnce()) -> Option<CleanupReport> {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("shutdown drain already performed");
            return None;
        }
        on_start();

        let entries: Vec<CleanupEntry> = std::mem::take(&mut *self.entries.lock()).into();
        tracing::info!(actions = entries.len(), "draining shutdown registry");

        let report = self.run_entries(entries);
        if report.is_success() {
            tracing::info!(executed = report.executed.len(), "shutdown drain complete");
        } else {
            tracing::error!(
                executed = report.executed.len(),
                failed = report.failures.len(),
                "shutdown drain finished with failures"
            );
        }
        Some(report)
    }

    fn run_entries(&self, entries: Vec<CleanupEntry>) -> CleanupReport {
        let mut report = CleanupReport::with_capacity(entries.len());

        for entry in entries {
            if self.logging_enabled() {
                self.print_line(&entry.label);
            }

            tracing::debug!(label = %entry.label, "running cleanup action");
            let cleanup_fn = &entry.cleanup_fn;
            match panic::catch_unwind(AssertUnwindSafe(|| cleanup_fn())) {
                Ok(()) => report.record_success(entry.label),
                Err(payload) => {
                    let message = panic_message(&*payload);
                    tracing::warn!(label = %entry.label, %message, "cleanup action panicked");
                    report.record_failure(entry.label, message);
                }
            }
        }

        report
    }

    /// Print the configured signal notice if logging is enabled
    pub(crate) fn announce(&self) {
        if self.logging_enabled() {
            self.print_line(&self.config.notice);
        }
    }

    fn print_line(&self, line: &str) {
        let mut output = self.output.lock();
        let result = writeln!(output, "{line}").and_then(|()| output.flush());
        if let Err(e) = result {
            let err = Error::from(e);
            tracing::warn!(error = %err, "console output unavailable");
        }
    }

    /// Toggle console output of action labels
    pub fn set_logging(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Relaxed);
    }

    /// Whether action labels are printed before each action runs
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logging.load(Ordering::Relaxed)
    }

    /// Whether the one-shot drain has started
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Number of registered actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Labels in run order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.label.clone()).collect()
    }

    #[must_use]
    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }
}

impl Default for ShutdownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownRegistry")
            .field("labels", &self.labels())
            .field("logging", &self.logging_enabled())
            .field("drained", &self.is_drained())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
