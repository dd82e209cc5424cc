//! Core errors and constants for the `closer` workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias
//!   shared by the registry, the configuration loader and the binary.
//! - **`constants`**: Environment variable names and default values.

pub mod constants;
pub mod errors;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
};
