//! Shared utilities for closer
//!
//! Currently this is the diagnostic logging setup used by the `closer`
//! binary and by hosts that want the same output format.

pub mod tracing;
