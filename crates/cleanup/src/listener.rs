//! Awaitable, cancellable signal shutdown.
//!
//! Unlike [`ShutdownRegistry::arm_signal_shutdown`], nothing here exits the
//! process: the caller gets a [`ShutdownOutcome`] back and decides what to do
//! with it. That keeps the drain testable in-process.

use crate::registry::ShutdownRegistry;
use crate::report::CleanupReport;
use crate::signal::TerminationSignal;
use closer_core::{Error, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Result of a signal-triggered drain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownOutcome {
    /// The signal that triggered the drain
    pub signal: TerminationSignal,
    /// `None` when the registry had already been drained elsewhere
    pub report: Option<CleanupReport>,
    /// Status the host should pass to `std::process::exit`
    pub exit_code: i32,
}

/// SIGINT and SIGTERM listeners registered with the tokio runtime.
///
/// Handlers are installed by [`TerminationSignals::new`], so a signal that
/// arrives between construction and [`recv`](Self::recv) is not lost.
#[derive(Debug)]
pub struct TerminationSignals {
    #[cfg(unix)]
    sigint: Signal,
    #[cfg(unix)]
    sigterm: Signal,
}

impl TerminationSignals {
    /// Install the listeners. Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn new() -> Result<Self> {
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| Error::signal("listening for SIGINT", e))?;
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| Error::signal("listening for SIGTERM", e))?;
        Ok(Self { sigint, sigterm })
    }

    #[cfg(not(unix))]
    pub fn new() -> Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Result<TerminationSignal> {
        tokio::select! {
            Some(()) = self.sigint.recv() => Ok(TerminationSignal::Interrupt),
            Some(()) = self.sigterm.recv() => Ok(TerminationSignal::Terminate),
            else => Err(Error::signal(
                "waiting for termination signals",
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "signal streams closed"),
            )),
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Result<TerminationSignal> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::signal("waiting for Ctrl+C", e))?;
        Ok(TerminationSignal::Interrupt)
    }
}

/// Wait for a termination signal or cancellation, then drain.
///
/// On a signal the configured notice is printed (when logging is enabled and
/// this call wins the drain) and the registry is drained on the current
/// task; the actions are plain blocking closures, so prefer
/// [`ShutdownRegistry::spawn_signal_listener`] inside a busy runtime.
/// Cancellation returns `Ok(None)` and runs nothing. The configured exit
/// code is validated before waiting.
pub async fn drain_on_signal(
    registry: &ShutdownRegistry,
    signals: TerminationSignals,
    cancel: CancellationToken,
) -> Result<Option<ShutdownOutcome>> {
    registry.config().validate()?;
    match wait_for_signal(signals, cancel).await? {
        Some(signal) => Ok(Some(drain_after(registry, signal))),
        None => Ok(None),
    }
}

async fn wait_for_signal(
    mut signals: TerminationSignals,
    cancel: CancellationToken,
) -> Result<Option<TerminationSignal>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!("signal listener cancelled");
            Ok(None)
        }
        signal = signals.recv() => signal.map(Some),
    }
}

fn drain_after(registry: &ShutdownRegistry, signal: TerminationSignal) -> ShutdownOutcome {
    tracing::info!(%signal, "received termination signal, cleaning up");
    ShutdownOutcome {
        signal,
        report: registry.drain_announced(),
        exit_code: registry.config().exit_code,
    }
}

impl ShutdownRegistry {
    /// Wait for a termination signal as a tokio task, then drain.
    ///
    /// The exit code is validated and the signal handlers are installed
    /// before this returns. The drain itself runs on the blocking pool so
    /// slow actions do not stall runtime workers.
    pub fn spawn_signal_listener(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<Result<Option<ShutdownOutcome>>>> {
        self.config().validate()?;
        let signals = TerminationSignals::new()?;
        let registry = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let Some(signal) = wait_for_signal(signals, cancel).await? else {
                return Ok(None);
            };
            let outcome = tokio::task::spawn_blocking(move || drain_after(&registry, signal))
                .await
                .map_err(|e| Error::task("shutdown drain", e.to_string()))?;
            Ok(Some(outcome))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use closer_config::ShutdownConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cancel_runs_nothing() {
        let registry = Arc::new(ShutdownRegistry::with_output(
            ShutdownConfig::default(),
            std::io::sink(),
        ));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.register("close-db", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let cancel = CancellationToken::new();
        let handle = registry.spawn_signal_listener(cancel.clone()).unwrap();
        cancel.cancel();

        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!registry.is_drained());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_listeners_reject_exit_codes_that_would_report_success() {
        for code in [0, 256] {
            let registry = Arc::new(ShutdownRegistry::with_output(
                ShutdownConfig::default().with_exit_code(code),
                std::io::sink(),
            ));

            let err = registry
                .spawn_signal_listener(CancellationToken::new())
                .unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }), "code {code}: {err}");

            let signals = TerminationSignals::new().unwrap();
            let err = drain_on_signal(&registry, signals, CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }), "code {code}: {err}");
        }
    }

    #[tokio::test]
    async fn test_already_cancelled_token_returns_immediately() {
        let registry = ShutdownRegistry::with_output(ShutdownConfig::default(), std::io::sink());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let signals = TerminationSignals::new().unwrap();
        let outcome = drain_on_signal(&registry, signals, cancel).await.unwrap();
        assert!(outcome.is_none());
    }
}
