//! Configuration for the closer shutdown coordinator
//!
//! `ShutdownConfig` carries the knobs the registry and its signal listeners
//! read; `ConfigLoader` layers a JSON file and `CLOSER_*` environment
//! variables over the defaults.

pub mod config;
pub mod loader;


pub use config::ShutdownConfig;
pub use loader::ConfigLoader;
