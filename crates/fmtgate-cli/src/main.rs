//! fmtgate - formatter gate for pre-commit hooks
//!
//! ## Commands
//!
//! - `check`: run the formatter in check mode over the given files; exits 0
//!   when they are formatted, 1 when the commit should be blocked
//! - `parse`: turn captured formatter output into JSON diagnostics
//!
//! Exit code 2 means fmtgate itself could not run (bad configuration,
//! unreadable input).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fmtgate_core::{parse_output, CheckReport, FormatCheckConfig, FormatCheckRunner};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(name = "fmtgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Block commits whose files fail an external formatter check", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "FMTGATE_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the formatter in check mode over FILES
    ///
    /// Options left unset fall back to FMTGATE_* environment variables,
    /// then to scalafmt defaults.
    Check {
        /// Formatter executable (default: scalafmt)
        #[arg(short, long)]
        executable: Option<String>,

        /// Check-mode flag passed before the files; repeatable (default: --test)
        #[arg(short, long = "flag", allow_hyphen_values = true)]
        flags: Vec<String>,

        /// Per-invocation timeout in milliseconds (default: 30000)
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Only check files with this extension; repeatable (default: every file)
        #[arg(short, long = "include")]
        include: Vec<String>,

        /// Check every file, overriding FMTGATE_INCLUDE
        #[arg(long, conflicts_with = "include")]
        all_files: bool,

        /// Upper bound on one command line in bytes
        #[arg(long)]
        max_command_bytes: Option<usize>,

        /// Directory to run the formatter in
        #[arg(short = 'C', long)]
        working_dir: Option<PathBuf>,

        /// Print a JSON report on stdout instead of the plain message
        #[arg(long)]
        json_report: bool,

        /// Files to check (as supplied by the hook framework)
        files: Vec<String>,
    },

    /// Parse formatter output into JSON diagnostics
    Parse {
        /// File holding captured output (default: stdin)
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    fmtgate_core::init_tracing(cli.json, level);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fmtgate: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Check {
            executable,
            flags,
            timeout_ms,
            include,
            all_files,
            max_command_bytes,
            working_dir,
            json_report,
            files,
        } => {
            let overrides = CheckOverrides {
                executable,
                flags,
                timeout_ms,
                include,
                all_files,
                max_command_bytes,
                working_dir,
            };
            let config = overrides.apply(
                FormatCheckConfig::from_env().context("Invalid FMTGATE_* environment")?,
            );
            config.validate().context("Invalid check configuration")?;
            cmd_check(config, &files, json_report).await
        }
        Commands::Parse { input } => cmd_parse(input.as_deref()),
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default)]
struct CheckOverrides {
    executable: Option<String>,
    flags: Vec<String>,
    timeout_ms: Option<u64>,
    include: Vec<String>,
    all_files: bool,
    max_command_bytes: Option<usize>,
    working_dir: Option<PathBuf>,
}

impl CheckOverrides {
    fn apply(self, mut config: FormatCheckConfig) -> FormatCheckConfig {
        if let Some(executable) = self.executable {
            config.executable = executable;
        }
        if !self.flags.is_empty() {
            config.check_flags = self.flags;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.all_files {
            config = config.include_all();
        } else if !self.include.is_empty() {
            let include: Vec<&str> = self.include.iter().map(String::as_str).collect();
            config = config.with_include_extensions(&include);
        }
        if let Some(max) = self.max_command_bytes {
            config.max_command_bytes = max;
        }
        if let Some(dir) = self.working_dir {
            config.working_dir = Some(dir);
        }
        config
    }
}

/// Run the check and report it
async fn cmd_check(config: FormatCheckConfig, files: &[String], json_report: bool) -> Result<ExitCode> {
    debug!(executable = %config.executable, files = files.len(), "Running format check");

    let runner = FormatCheckRunner::new(config);
    let report = runner.run(files).await;

    if json_report {
        println!("{}", render_json(&report)?);
    } else if let Some(message) = report.outcome.message() {
        println!("{}", message);
    }

    Ok(exit_code_for(&report))
}

/// Parse captured formatter output
fn cmd_parse(input: Option<&std::path::Path>) -> Result<ExitCode> {
    let output = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let diagnostics = parse_output(&output);
    println!(
        "{}",
        serde_json::to_string_pretty(&diagnostics).context("Failed to serialize diagnostics")?
    );
    Ok(ExitCode::SUCCESS)
}

fn render_json(report: &CheckReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize check report")
}

fn exit_code_for(report: &CheckReport) -> ExitCode {
    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
