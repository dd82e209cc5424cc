/// Result type alias for closer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for closer operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Signal listener installation errors
    #[error("failed to install signal listener: {message}")]
    Signal {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// One or more cleanup actions panicked during a drain
    #[error("{failed} of {total} cleanup actions failed: {}", .details.join("; "))]
    CleanupFailed {
        failed: usize,
        total: usize,
        details: Vec<String>,
    },

    /// Registration attempted after the final drain began
    #[error("cannot register '{label}': shutdown drain already started")]
    Drained { label: String },

    /// Console output errors
    #[error("failed to write cleanup output: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },

    /// Configuration file errors
    #[error("failed to read configuration from '{path}': {source}")]
    ConfigFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Background task failures
    #[error("{task} task failed: {message}")]
    Task { task: String, message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Output { source: error }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a signal installation error
    #[must_use]
    pub fn signal(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::Signal {
            message: message.into(),
            source,
        }
    }

    /// Create an aggregate cleanup error
    #[must_use]
    pub fn cleanup_failed(total: usize, details: Vec<String>) -> Self {
        Error::CleanupFailed {
            failed: details.len(),
            total,
            details,
        }
    }

    /// Create a rejected-registration error
    #[must_use]
    pub fn drained(label: impl Into<String>) -> Self {
        Error::Drained {
            label: label.into(),
        }
    }

    /// Create a background task error
    #[must_use]
    pub fn task(task: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Task {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create a configuration file error with context
    #[must_use]
    pub fn config_file(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Error::ConfigFile {
            path: path.into(),
            source,
        }
    }
}

// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", message.into(), base_error),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", f(), base_error),
            }
        })
    }
}
