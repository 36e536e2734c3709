//! Check outcomes surfaced to the hook framework.

use crate::diagnostics::FormatDiagnostic;
use crate::error::RunnerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a check failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The formatter ran and reported non-conforming files.
    FormattingIssues {
        message: String,
        diagnostics: Vec<FormatDiagnostic>,
    },

    /// The formatter binary is missing or could not be executed, or its
    /// output was lost after it started (`output_lost`).
    ToolUnavailable {
        executable: String,
        reason: String,
        #[serde(default)]
        output_lost: bool,
    },

    /// The formatter did not finish in time and was killed.
    Timeout { executable: String, timeout_ms: u64 },
}

impl FailureReason {
    /// Formatting failure with the standard advice for `tool`.
    pub fn formatting(tool: &str, diagnostics: Vec<FormatDiagnostic>) -> Self {
        FailureReason::FormattingIssues {
            message: formatting_message(tool),
            diagnostics,
        }
    }

    /// Stable short name, used in logs and JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::FormattingIssues { .. } => "formatting_issues",
            FailureReason::ToolUnavailable { .. } => "tool_unavailable",
            FailureReason::Timeout { .. } => "timeout",
        }
    }

    /// Message shown to the user when the commit is blocked. Never empty.
    pub fn message(&self) -> String {
        match self {
            FailureReason::FormattingIssues {
                message,
                diagnostics,
            } => {
                let mut out = message.clone();
                for diag in diagnostics {
                    out.push_str("\n  ");
                    out.push_str(&diag.to_string());
                }
                out
            }
            FailureReason::ToolUnavailable {
                executable,
                reason,
                output_lost: true,
            } => format!(
                "Lost output from '{}' ({}). Run it manually before committing.",
                executable, reason
            ),
            FailureReason::ToolUnavailable {
                executable, reason, ..
            } => format!(
                "Could not run '{}' ({}). Install it or point FMTGATE_EXECUTABLE at it before committing.",
                executable, reason
            ),
            FailureReason::Timeout {
                executable,
                timeout_ms,
            } => format!(
                "'{}' did not finish within {}ms and was stopped. Run it manually before committing.",
                executable, timeout_ms
            ),
        }
    }
}

impl From<RunnerError> for FailureReason {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::ToolUnavailable { executable, reason } => {
                FailureReason::ToolUnavailable {
                    executable,
                    reason,
                    output_lost: false,
                }
            }
            RunnerError::Timeout {
                executable,
                timeout_ms,
            } => FailureReason::Timeout {
                executable,
                timeout_ms,
            },
            RunnerError::Io { executable, source } => FailureReason::ToolUnavailable {
                executable,
                reason: source.to_string(),
                output_lost: true,
            },
        }
    }
}

/// The fixed advice attached to every formatting failure.
pub fn formatting_message(tool: &str) -> String {
    format!(
        "You have non-formatted files, run {} before committing.",
        tool
    )
}

/// Result of a check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Fail(FailureReason),
}

impl CheckOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass)
    }

    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            CheckOutcome::Pass => None,
            CheckOutcome::Fail(reason) => Some(reason),
        }
    }

    /// User-facing message; `None` on pass.
    pub fn message(&self) -> Option<String> {
        self.reason().map(FailureReason::message)
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Pass => f.write_str("pass"),
            CheckOutcome::Fail(reason) => write!(f, "fail: {}", reason.message()),
        }
    }
}

/// Serializable summary of one check, for machine-readable output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckReport {
    pub outcome: CheckOutcome,

    /// Files handed to the formatter.
    pub files_checked: usize,

    /// Files dropped by the include filter.
    pub files_skipped: usize,

    /// Number of formatter processes spawned.
    pub invocations: usize,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    pub finished_at: DateTime<Utc>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }
}
