/// Constants used throughout the closer codebase
// Environment variable names
pub const CLOSER_LOGGING_VAR: &str = "CLOSER_LOGGING";
pub const CLOSER_EXIT_CODE_VAR: &str = "CLOSER_EXIT_CODE";
pub const CLOSER_NOTICE_VAR: &str = "CLOSER_NOTICE";
pub const CLOSER_FORCE_EXIT_VAR: &str = "CLOSER_FORCE_EXIT_ON_REPEAT";

// Printed once before a signal-triggered drain
pub const DEFAULT_SIGNAL_NOTICE: &str = "SIGTERM RECEIVED. CLOSING SERVER";

// Exit status used after a signal-triggered drain
pub const DEFAULT_EXIT_CODE: i32 = 1;

// Valid range for a shutdown exit status
pub const MIN_EXIT_CODE: i32 = 1;
pub const MAX_EXIT_CODE: i32 = 255;
