//! In-memory fakes for the process seam (testing only).
//!
//! [`ScriptedRunner`] satisfies [`CommandRunner`] without spawning anything:
//! it replays queued results in order and records every invocation.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult, Invocation};

/// Replays scripted results; once the script runs out every call succeeds.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<RunnerResult<ExecutionResult>>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completed run.
    pub fn push_result(&self, result: ExecutionResult) {
        self.script.lock().unwrap().push_back(Ok(result));
    }

    /// Queue a runner failure (missing tool, timeout, ...).
    pub fn push_error(&self, error: RunnerError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Every invocation seen so far, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        self.invocations.lock().unwrap().push(invocation.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecutionResult::success()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_replays_in_order() {
        let fake = ScriptedRunner::new();
        fake.push_result(ExecutionResult::failure(1));
        fake.push_error(RunnerError::Timeout {
            executable: "scalafmt".to_string(),
            timeout_ms: 1,
        });

        let inv = Invocation::new("scalafmt", vec!["--test".to_string()], 1);
        assert!(!fake.run(&inv).await.expect("first").success);
        assert!(fake.run(&inv).await.is_err());
        assert!(fake.run(&inv).await.expect("exhausted").success);
        assert_eq!(fake.invocations().len(), 3);
    }
}
