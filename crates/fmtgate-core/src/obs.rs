//! Structured lifecycle events for formatter checks.
//!
//! Every check runs inside a [`CheckSpan`] tagged with a fresh check id, so
//! per-batch events from concurrent checks can be told apart.

use crate::outcome::CheckOutcome;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A check-scoped span tagged with a fresh check id.
///
/// Attach it to the check future with [`tracing::Instrument`]; an entered
/// guard cannot be held across `.await` in a `Send` future.
pub struct CheckSpan {
    check_id: Uuid,
    span: tracing::Span,
}

impl CheckSpan {
    /// Create a span for a check run by `executable`.
    pub fn new(executable: &str) -> Self {
        let check_id = Uuid::new_v4();
        let span = tracing::info_span!("fmtgate.check", check_id = %check_id, executable = %executable);
        Self { check_id, span }
    }

    pub fn check_id(&self) -> Uuid {
        self.check_id
    }

    pub fn into_span(self) -> tracing::Span {
        self.span
    }
}

/// Check started with `files` after filtering, `skipped` dropped by the include filter.
pub fn emit_check_started(files: usize, skipped: usize, batches: usize) {
    info!(
        event = "check.started",
        files = files,
        skipped = skipped,
        batches = batches
    );
}

/// One formatter process finished.
pub fn emit_invocation_finished(batch: usize, exit_code: Option<i32>, duration_ms: u64) {
    debug!(
        event = "check.invocation_finished",
        batch = batch,
        exit_code = ?exit_code,
        duration_ms = duration_ms
    );
}

/// Check finished.
pub fn emit_check_finished(outcome: &CheckOutcome, duration_ms: u64) {
    match outcome.reason() {
        None => info!(event = "check.finished", passed = true, duration_ms = duration_ms),
        Some(reason) => warn!(
            event = "check.finished",
            passed = false,
            reason = reason.kind(),
            duration_ms = duration_ms
        ),
    }
}
