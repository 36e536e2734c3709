//! Formatter check execution and classification.

use crate::batch::{base_command_len, split_batches};
use crate::config::FormatCheckConfig;
use crate::diagnostics::{parse_output, FormatDiagnostic};
use crate::obs::{self, CheckSpan};
use crate::outcome::{CheckOutcome, CheckReport, FailureReason};
use crate::runner::{CommandRunner, Invocation, ProcessRunner};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, Instrument};

/// A pre-commit check over a set of files.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Check `files` and classify the result. Never fails: every error is
    /// folded into [`CheckOutcome::Fail`].
    async fn check(&self, files: &[String]) -> CheckOutcome;
}

/// Runs an external formatter in check mode and turns its exit status into a
/// [`CheckOutcome`].
#[derive(Clone)]
pub struct FormatCheckRunner {
    config: FormatCheckConfig,
    runner: Arc<dyn CommandRunner>,
}

impl FormatCheckRunner {
    /// Runner that spawns real processes.
    pub fn new(config: FormatCheckConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner::new()))
    }

    /// Runner that executes through `runner`.
    pub fn with_runner(config: FormatCheckConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &FormatCheckConfig {
        &self.config
    }

    /// Command line for one batch of files.
    pub fn invocation_for(&self, files: &[String]) -> Invocation {
        let args = self
            .config
            .check_flags
            .iter()
            .chain(files.iter())
            .cloned()
            .collect();
        Invocation::new(&self.config.executable, args, self.config.timeout_ms)
            .in_dir(self.config.working_dir.clone())
    }

    /// Check `files` and return the outcome plus execution statistics.
    pub async fn run(&self, files: &[String]) -> CheckReport {
        let span = CheckSpan::new(&self.config.executable).into_span();
        self.run_inner(files).instrument(span).await
    }

    async fn run_inner(&self, files: &[String]) -> CheckReport {
        let start = Instant::now();

        let (selected, skipped): (Vec<String>, Vec<String>) = files
            .iter()
            .cloned()
            .partition(|f| self.config.applies_to(f));
        if !skipped.is_empty() {
            debug!(skipped = ?skipped, "Files excluded by include filter");
        }

        let base_len = base_command_len(&self.config.executable, &self.config.check_flags);
        let batches = split_batches(&selected, base_len, self.config.max_command_bytes);
        obs::emit_check_started(selected.len(), skipped.len(), batches.len());

        let mut invocations = 0;
        let mut formatting_failed = false;
        let mut diagnostics: Vec<FormatDiagnostic> = Vec::new();
        let mut aborted: Option<FailureReason> = None;

        for (index, batch) in batches.iter().enumerate() {
            let invocation = self.invocation_for(batch);
            invocations += 1;

            match self.runner.run(&invocation).await {
                Ok(result) => {
                    obs::emit_invocation_finished(index, result.exit_code, result.duration_ms);
                    if !result.success {
                        formatting_failed = true;
                        for diag in parse_output(&result.combined_output()) {
                            if !diagnostics.contains(&diag) {
                                diagnostics.push(diag);
                            }
                        }
                    }
                }
                Err(err) => {
                    // Missing tool or timeout: later batches would fail the same way.
                    aborted = Some(err.into());
                    break;
                }
            }
        }

        let outcome = match aborted {
            Some(reason) => CheckOutcome::Fail(reason),
            None if formatting_failed => CheckOutcome::Fail(FailureReason::formatting(
                self.config.tool_name(),
                diagnostics,
            )),
            None => CheckOutcome::Pass,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_check_finished(&outcome, duration_ms);

        CheckReport {
            outcome,
            files_checked: selected.len(),
            files_skipped: skipped.len(),
            invocations,
            duration_ms,
            finished_at: Utc::now(),
        }
    }
}

#[async_trait]
impl Checker for FormatCheckRunner {
    async fn check(&self, files: &[String]) -> CheckOutcome {
        self.run(files).await.outcome
    }
}
