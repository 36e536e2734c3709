//! fmtgate - formatter-gated pre-commit checks
//!
//! Runs an external code formatter (scalafmt by default) in check mode over
//! the files a hook framework hands in, and classifies the result:
//! - exit success -> [`CheckOutcome::Pass`]
//! - non-success exit -> [`FailureReason::FormattingIssues`], enriched with
//!   the files the formatter reported
//! - missing binary -> [`FailureReason::ToolUnavailable`]
//! - deadline exceeded -> [`FailureReason::Timeout`], process killed

pub mod batch;
pub mod check;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fakes;
pub mod obs;
pub mod outcome;
pub mod runner;
pub mod telemetry;

// Re-export key types
pub use check::{Checker, FormatCheckRunner};
pub use config::FormatCheckConfig;
pub use diagnostics::{parse_line, parse_output, FormatDiagnostic, Severity};
pub use error::{ConfigError, RunnerError};
pub use outcome::{CheckOutcome, CheckReport, FailureReason};
pub use runner::{CommandRunner, ExecutionResult, Invocation, ProcessRunner};
pub use telemetry::init_tracing;
