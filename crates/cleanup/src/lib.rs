//! Labelled cleanup actions run in FILO order at process shutdown.
//!
//! A [`ShutdownRegistry`] collects `(label, action)` pairs. The most recently
//! registered action runs first, the way a stack of scope guards would
//! unwind. Actions run either on demand ([`ShutdownRegistry::run_all`],
//! [`ShutdownRegistry::drain`]) or when the process receives SIGINT/SIGTERM.
//!
//! ## Key Components
//!
//! - **`registry`**: the registry itself, console output of labels and the
//!   one-shot drain.
//! - **`report`**: per-pass results; a panicking action is recorded and the
//!   remaining actions still run.
//! - **`signal`**: `arm_signal_shutdown`, a background thread that drains and
//!   exits on the first termination signal.
//! - **`listener`**: an awaitable, cancellable variant that drains without
//!   exiting so the host decides what happens next.
//!
//! ```no_run
//! use closer_cleanup::ShutdownRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ShutdownRegistry::new());
//! registry.register("close-db", || { /* ... */ });
//! registry.register("flush-logs", || { /* ... */ });
//! registry.arm_signal_shutdown()?;
//! # Ok::<(), closer_cleanup::Error>(())
//! ```

pub mod listener;
pub mod registry;
pub mod report;
pub mod signal;

pub use closer_core::{Error, Result};
pub use listener::{drain_on_signal, ShutdownOutcome, TerminationSignals};
pub use registry::ShutdownRegistry;
pub use report::{CleanupFailure, CleanupReport};
pub use signal::TerminationSignal;
