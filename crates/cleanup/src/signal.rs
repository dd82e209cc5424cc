//! Fire-and-forget signal shutdown on a dedicated thread.
//!
//! Once armed, the first SIGINT or SIGTERM prints the configured notice,
//! drains the registry and exits the process. A repeated signal while the
//! drain is still running exits immediately with the same status.

use crate::registry::ShutdownRegistry;
use closer_core::{Error, Result};
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The termination signals the listeners react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationSignal {
    /// SIGINT, usually Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl TerminationSignal {
    #[cfg(unix)]
    pub(crate) const RAW: [i32; 2] = [
        signal_hook::consts::SIGINT,
        signal_hook::consts::SIGTERM,
    ];

    /// Map a raw signal number
    #[cfg(unix)]
    #[must_use]
    pub fn from_raw(signal: i32) -> Option<Self> {
        match signal {
            signal_hook::consts::SIGINT => Some(Self::Interrupt),
            signal_hook::consts::SIGTERM => Some(Self::Terminate),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ShutdownRegistry {
    /// Drain the registry and exit the process on SIGINT or SIGTERM.
    ///
    /// Returns as soon as the handlers are installed; the drain runs on a
    /// background thread named `closer-signal`. Arming an already armed
    /// registry is a no-op. The process exits with `config().exit_code`,
    /// which is validated before anything is installed. On error nothing
    /// stays installed and arming may be retried.
    #[cfg(unix)]
    pub fn arm_signal_shutdown(self: &Arc<Self>) -> Result<()> {
        if self.armed.swap(true, Ordering::AcqRel) {
            tracing::debug!("signal shutdown already armed");
            return Ok(());
        }

        if let Err(e) = self.install_signal_thread() {
            self.armed.store(false, Ordering::Release);
            return Err(e);
        }

        tracing::info!(exit_code = self.config().exit_code, "signal shutdown armed");
        Ok(())
    }

    #[cfg(unix)]
    fn install_signal_thread(self: &Arc<Self>) -> Result<()> {
        use signal_hook::{flag, iterator::Signals};

        self.config().validate()?;
        let exit_code = self.config().exit_code;

        // Dropping `signals` on an error path unregisters its handlers.
        let mut signals = Signals::new(TerminationSignal::RAW)
            .map_err(|e| Error::signal("registering SIGINT/SIGTERM handlers", e))?;

        let mut repeat_ids = Vec::with_capacity(TerminationSignal::RAW.len());
        if self.config().force_exit_on_repeat {
            // Fires only once `draining` is set, i.e. on a signal received mid-drain.
            for sig in TerminationSignal::RAW {
                match flag::register_conditional_shutdown(sig, exit_code, Arc::clone(&self.draining))
                {
                    Ok(id) => repeat_ids.push(id),
                    Err(e) => {
                        unregister_all(&repeat_ids);
                        return Err(Error::signal("registering repeat-signal shutdown", e));
                    }
                }
            }
        }

        let registry = Arc::clone(self);
        std::thread::Builder::new()
            .name("closer-signal".to_string())
            .spawn(move || {
                #[allow(clippy::never_loop)]
                for sig in signals.forever() {
                    let signal = TerminationSignal::from_raw(sig)
                        .map_or_else(|| sig.to_string(), |s| s.to_string());
                    tracing::info!(%signal, "received termination signal, cleaning up");

                    if registry.drain_announced().is_none() {
                        tracing::info!("registry already drained, exiting");
                    }

                    std::process::exit(exit_code);
                }
            })
            .map_err(|e| {
                unregister_all(&repeat_ids);
                Error::signal("spawning signal listener thread", e)
            })?;

        Ok(())
    }

    /// Signal shutdown needs unix signal handling.
    #[cfg(not(unix))]
    pub fn arm_signal_shutdown(self: &Arc<Self>) -> Result<()> {
        Err(Error::signal(
            "arming signal shutdown",
            std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "use drain_on_signal on this platform",
            ),
        ))
    }
}

#[cfg(unix)]
fn unregister_all(ids: &[signal_hook::SigId]) {
    for id in ids {
        signal_hook::low_level::unregister(*id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(TerminationSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(TerminationSignal::Terminate.to_string(), "SIGTERM");
    }

    #[cfg(unix)]
    #[test]
    fn test_from_raw() {
        assert_eq!(
            TerminationSignal::from_raw(signal_hook::consts::SIGINT),
            Some(TerminationSignal::Interrupt)
        );
        assert_eq!(
            TerminationSignal::from_raw(signal_hook::consts::SIGTERM),
            Some(TerminationSignal::Terminate)
        );
        assert_eq!(TerminationSignal::from_raw(signal_hook::consts::SIGHUP), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_arming_twice_is_a_noop() {
        let registry = Arc::new(ShutdownRegistry::with_output(
            closer_config::ShutdownConfig::default(),
            std::io::sink(),
        ));

        registry.arm_signal_shutdown().unwrap();
        registry.arm_signal_shutdown().unwrap();
        assert!(registry.armed.load(Ordering::Acquire));
        assert!(!registry.is_drained());
    }

    #[cfg(unix)]
    #[test]
    fn test_arming_rejects_exit_codes_that_would_report_success() {
        for code in [0, 256, -1] {
            let registry = Arc::new(ShutdownRegistry::with_output(
                closer_config::ShutdownConfig::default().with_exit_code(code),
                std::io::sink(),
            ));

            let err = registry.arm_signal_shutdown().unwrap_err();
            assert!(
                matches!(err, Error::Configuration { .. }),
                "exit code {code} should be rejected, got {err}"
            );
            // A failed arm leaves nothing behind, so it is not mistaken for armed.
            assert!(!registry.armed.load(Ordering::Acquire));
            assert!(registry.arm_signal_shutdown().is_err());
        }
    }
}
