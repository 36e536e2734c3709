//! Integration tests for FormatCheckRunner against real child processes.
//!
//! A small shell script stands in for scalafmt: it reports every argument
//! containing "Bad" as unformatted and exits 1 if it found any.

#![cfg(unix)]

use fmtgate_core::{
    CheckOutcome, Checker, FailureReason, FormatCheckConfig, FormatCheckRunner, Severity,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FAKE_FORMATTER: &str = r#"
status=0
for f in "$@"; do
  case "$f" in
    *Bad*) echo "[error] $f has changes after scalafmt" >&2; status=1 ;;
    *Warn*) echo "[warn] $f has changes after scalafmt"; status=1 ;;
  esac
done
exit $status
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    path
}

/// Config running the fake formatter through `sh`, so the script never needs the exec bit.
fn fake_formatter_config(dir: &TempDir) -> FormatCheckConfig {
    let script = write_script(dir.path(), "fake-scalafmt.sh", FAKE_FORMATTER);
    let script = script.to_string_lossy().to_string();
    FormatCheckConfig::new("sh", &[script.as_str()]).with_timeout_ms(10_000)
}

fn files(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Test: clean files pass
#[tokio::test]
async fn test_clean_files_pass() {
    let dir = TempDir::new().expect("tempdir");
    let runner = FormatCheckRunner::new(fake_formatter_config(&dir));

    let outcome = runner.check(&files(&["A.scala", "build.sbt"])).await;
    assert_eq!(outcome, CheckOutcome::Pass);
}

/// Test: empty file set passes even with a broken executable
#[tokio::test]
async fn test_empty_file_set_never_spawns() {
    let config = FormatCheckConfig::default().with_executable("fmtgate-missing-formatter");
    let runner = FormatCheckRunner::new(config);

    let report = runner.run(&[]).await;
    assert!(report.passed());
    assert_eq!(report.invocations, 0);
}

/// Test: unformatted file blocks the commit and is named in the message
#[tokio::test]
async fn test_unformatted_file_fails_with_message() {
    let dir = TempDir::new().expect("tempdir");
    let runner = FormatCheckRunner::new(fake_formatter_config(&dir));

    let outcome = runner
        .check(&files(&["A.scala", "BadFormat.scala", "WarnMe.scala"]))
        .await;

    let diagnostics = match outcome.reason() {
        Some(FailureReason::FormattingIssues { diagnostics, .. }) => diagnostics.clone(),
        other => panic!("expected formatting failure, got {:?}", other),
    };
    assert_eq!(diagnostics.len(), 2);
    // stdout is parsed before stderr
    assert_eq!(diagnostics[0].file, "WarnMe.scala");
    assert_eq!(diagnostics[0].severity, Severity::Warn);
    assert_eq!(diagnostics[1].file, "BadFormat.scala");
    assert_eq!(diagnostics[1].severity, Severity::Error);

    let message = outcome.message().expect("message");
    assert!(message.contains("non-formatted files"));
    assert!(message.contains("before committing"));
    assert!(message.contains("BadFormat.scala"));
}

/// Test: the canonical scalafmt failure line
#[tokio::test]
async fn test_scalafmt_error_line_example() {
    let config = FormatCheckConfig::new(
        "sh",
        &[
            "-c",
            "echo '[error] A.scala has changes after scalafmt' >&2; exit 1",
        ],
    );
    let runner = FormatCheckRunner::new(config);

    let outcome = runner.check(&files(&["A.scala"])).await;
    let message = outcome.message().expect("should fail");
    assert!(message.starts_with("You have non-formatted files, run sh before committing."));
    assert!(message.contains("[error] A.scala"));
}

/// Test: a missing binary is reported as unavailable, not as a formatting failure
#[tokio::test]
async fn test_missing_binary_is_tool_unavailable() {
    let config = FormatCheckConfig::default().with_executable("fmtgate-missing-formatter");
    let runner = FormatCheckRunner::new(config);

    let outcome = runner.check(&files(&["A.scala"])).await;
    match outcome {
        CheckOutcome::Fail(FailureReason::ToolUnavailable { executable, .. }) => {
            assert_eq!(executable, "fmtgate-missing-formatter");
        }
        other => panic!("expected tool unavailable, got {:?}", other),
    }
}

/// Test: a file without the exec bit is reported as unavailable
#[tokio::test]
async fn test_unexecutable_binary_is_tool_unavailable() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_script(dir.path(), "scalafmt", "#!/bin/sh\nexit 0\n");
    let config = FormatCheckConfig::default().with_executable(&script.to_string_lossy());
    let runner = FormatCheckRunner::new(config);

    let outcome = runner.check(&files(&["A.scala"])).await;
    assert_eq!(
        outcome.reason().map(FailureReason::kind),
        Some("tool_unavailable")
    );
}

/// Test: a hung formatter is killed and reported as a timeout
#[tokio::test]
async fn test_hung_formatter_times_out() {
    let config = FormatCheckConfig::new("sh", &["-c", "exec sleep 10"]).with_timeout_ms(300);
    let runner = FormatCheckRunner::new(config);

    let start = Instant::now();
    let outcome = runner.check(&files(&["A.scala"])).await;
    assert!(start.elapsed() < Duration::from_secs(5), "check should not wait for sleep");
    assert_eq!(
        outcome,
        CheckOutcome::Fail(FailureReason::Timeout {
            executable: "sh".to_string(),
            timeout_ms: 300,
        })
    );
}

/// Test: the timed-out formatter process is gone once the check returns
#[tokio::test]
async fn test_timed_out_formatter_is_killed() {
    let dir = TempDir::new().expect("tempdir");
    let pidfile = dir.path().join("scalafmt.pid");
    let pidfile = pidfile.to_string_lossy().to_string();
    let config = FormatCheckConfig::new(
        "sh",
        &["-c", r#"echo $$ > "$0"; exec sleep 10"#, pidfile.as_str()],
    )
    .with_timeout_ms(500);
    let runner = FormatCheckRunner::new(config);

    let outcome = runner.check(&files(&["A.scala"])).await;
    assert_eq!(outcome.reason().map(FailureReason::kind), Some("timeout"));

    let pid = std::fs::read_to_string(&pidfile).expect("pidfile");
    let alive = std::process::Command::new("kill")
        .args(["-0", pid.trim()])
        .stderr(std::process::Stdio::null())
        .status()
        .expect("kill");
    assert!(!alive.success(), "formatter pid {} survived the timeout", pid.trim());
}

/// Test: a formatter that exits 0 but leaves a background process passes
#[tokio::test]
async fn test_background_child_does_not_turn_pass_into_timeout() {
    let config =
        FormatCheckConfig::new("sh", &["-c", "sleep 5 & exit 0"]).with_timeout_ms(1000);
    let runner = FormatCheckRunner::new(config);

    let start = Instant::now();
    let outcome = runner.check(&files(&["A.scala"])).await;
    assert_eq!(outcome, CheckOutcome::Pass);
    assert!(start.elapsed() < Duration::from_millis(1000));
}

/// Test: `.sc` scripts reach the formatter with the default config
#[tokio::test]
async fn test_scala_script_files_reach_formatter() {
    let runner = FormatCheckRunner::new(FormatCheckConfig::new("sh", &["-c", "exit 1"]));

    let report = runner.run(&files(&["script.sc"])).await;
    assert_eq!(report.invocations, 1);
    assert_eq!(report.files_checked, 1);
    assert_eq!(
        report.outcome.reason().map(FailureReason::kind),
        Some("formatting_issues")
    );
}

/// Test: long file lists are split and any failing batch fails the check
#[tokio::test]
async fn test_batched_run_reports_failures_from_later_batches() {
    let dir = TempDir::new().expect("tempdir");
    let config = fake_formatter_config(&dir).with_max_command_bytes(1);
    let runner = FormatCheckRunner::new(config);

    let report = runner
        .run(&files(&["A.scala", "B.scala", "BadLast.scala"]))
        .await;
    assert_eq!(report.invocations, 3);
    assert_eq!(report.files_checked, 3);
    assert!(!report.passed());
    assert!(report
        .outcome
        .message()
        .expect("message")
        .contains("BadLast.scala"));
}

/// Test: the formatter runs in the configured working directory
#[tokio::test]
async fn test_working_dir_is_respected() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("marker"), "").expect("marker");
    let config = FormatCheckConfig::new("sh", &["-c", "test -f marker"])
        .with_working_dir(dir.path());
    let runner = FormatCheckRunner::new(config);

    assert!(runner.check(&files(&["A.scala"])).await.is_pass());
}

/// Test: one runner shared by concurrent checks
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_checks_share_runner() {
    let dir = TempDir::new().expect("tempdir");
    let runner = Arc::new(FormatCheckRunner::new(fake_formatter_config(&dir)));

    let clean = files(&["A.scala"]);
    let dirty = files(&["Bad.scala"]);
    let (a, b) = tokio::join!(runner.check(&clean), runner.check(&dirty));

    assert!(a.is_pass());
    assert!(!b.is_pass());
}
