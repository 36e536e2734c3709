//! Error types for fmtgate-core.

use thiserror::Error;

/// Errors produced while executing the external formatter.
///
/// These never escape a [`Checker`](crate::Checker); they are folded into a
/// [`CheckOutcome`](crate::CheckOutcome) by the check runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The executable could not be found or is not executable.
    #[error("'{executable}' is not installed or not executable: {reason}")]
    ToolUnavailable { executable: String, reason: String },

    /// The process exceeded its time budget and was killed.
    #[error("'{executable}' timed out after {timeout_ms}ms")]
    Timeout { executable: String, timeout_ms: u64 },

    /// Any other I/O failure while talking to the child process.
    #[error("I/O error while running '{executable}': {source}")]
    Io {
        executable: String,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The executable name was empty.
    #[error("formatter executable must not be empty")]
    EmptyExecutable,

    /// Timeout of zero milliseconds.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// No check-mode flags, so the formatter would rewrite files.
    #[error("check flags must not be empty (scalafmt needs --test to leave files untouched)")]
    EmptyCheckFlags,

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for command execution.
pub type RunnerResult<T> = std::result::Result<T, RunnerError>;
