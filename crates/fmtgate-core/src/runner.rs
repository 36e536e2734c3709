//! External process execution.
//!
//! [`CommandRunner`] is the seam between the check logic and the operating
//! system. [`ProcessRunner`] spawns real processes with tokio; tests use
//! [`ScriptedRunner`](crate::fakes::ScriptedRunner) instead.

use crate::error::{RunnerError, RunnerResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// A fully-built command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to spawn.
    pub executable: String,

    /// Arguments, flags first, then files.
    pub args: Vec<String>,

    /// Working directory (inherits the caller's when `None`).
    pub working_dir: Option<PathBuf>,

    /// Wall-clock limit in milliseconds.
    pub timeout_ms: u64,
}

impl Invocation {
    pub fn new(executable: &str, args: Vec<String>, timeout_ms: u64) -> Self {
        Self {
            executable: executable.to_string(),
            args,
            working_dir: None,
            timeout_ms,
        }
    }

    /// Run from `dir`.
    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one process run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the process exited with a success status.
    pub success: bool,

    /// Exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// A successful run with no output.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// A failed run with the given exit code and no output.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            ..Self::success()
        }
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    /// stdout followed by stderr.
    pub fn combined_output(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        combined.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            combined.push('\n');
        }
        combined.push_str(&self.stderr);
        combined
    }
}

/// Executes an [`Invocation`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion or until its timeout.
    ///
    /// Missing/unexecutable binaries map to [`RunnerError::ToolUnavailable`],
    /// an exceeded deadline to [`RunnerError::Timeout`].
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        let start = Instant::now();
        let executable = invocation.executable.as_str();

        let mut command = Command::new(executable);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        debug!(executable = %executable, args = invocation.args.len(), "Spawning formatter");

        let mut child = command.spawn().map_err(|e| RunnerError::ToolUnavailable {
            executable: executable.to_string(),
            reason: e.to_string(),
        })?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // The exit status decides completion. Pipes may stay open past exit
        // when the formatter leaves a background process holding them.
        let status = {
            let reading = async {
                tokio::try_join!(
                    read_pipe(stdout_pipe, &mut stdout),
                    read_pipe(stderr_pipe, &mut stderr)
                )
            };
            tokio::pin!(reading);
            let mut drained = false;

            let waited = tokio::time::timeout(Duration::from_millis(invocation.timeout_ms), async {
                loop {
                    tokio::select! {
                        status = child.wait() => break status,
                        read = &mut reading, if !drained => {
                            drained = true;
                            if let Err(e) = read {
                                break Err(e);
                            }
                        }
                    }
                }
            })
            .await;

            let status = match waited {
                Ok(Ok(status)) => status,
                Ok(Err(source)) => {
                    reap(&mut child, executable).await;
                    return Err(RunnerError::Io {
                        executable: executable.to_string(),
                        source,
                    });
                }
                Err(_) => {
                    warn!(
                        executable = %executable,
                        timeout_ms = invocation.timeout_ms,
                        "Formatter timed out, killing it"
                    );
                    reap(&mut child, executable).await;
                    return Err(RunnerError::Timeout {
                        executable: executable.to_string(),
                        timeout_ms: invocation.timeout_ms,
                    });
                }
            };

            if !drained {
                match tokio::time::timeout(Duration::from_millis(OUTPUT_GRACE_MS), &mut reading)
                    .await
                {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        debug!(executable = %executable, error = %e, "Reading output after exit failed");
                    }
                    Err(_) => {
                        debug!(
                            executable = %executable,
                            "Output still open after exit, keeping what was captured"
                        );
                    }
                }
            }
            status
        };

        Ok(ExecutionResult {
            success: status.success(),
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// How long output pipes may stay open once the formatter has exited.
const OUTPUT_GRACE_MS: u64 = 250;

/// Append everything `pipe` yields to `buf`. Bytes read before the future is
/// dropped stay in `buf`.
async fn read_pipe<R>(pipe: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    if let Some(mut pipe) = pipe {
        let mut chunk = [0u8; 8192];
        loop {
            let n = pipe.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
    Ok(())
}

/// Kill the child and wait for it so no zombie is left behind.
async fn reap(child: &mut tokio::process::Child, executable: &str) {
    if let Err(e) = child.kill().await {
        // Already exited between the deadline and the kill.
        debug!(executable = %executable, error = %e, "Kill after timeout failed");
    }
}
