//! Formatter check configuration.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default formatter executable.
pub const DEFAULT_EXECUTABLE: &str = "scalafmt";

/// Default per-invocation timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default upper bound on the length of one command line, in bytes.
pub const DEFAULT_MAX_COMMAND_BYTES: usize = 128 * 1024;

pub const ENV_EXECUTABLE: &str = "FMTGATE_EXECUTABLE";
pub const ENV_FLAGS: &str = "FMTGATE_FLAGS";
pub const ENV_TIMEOUT_MS: &str = "FMTGATE_TIMEOUT_MS";
pub const ENV_INCLUDE: &str = "FMTGATE_INCLUDE";
pub const ENV_MAX_COMMAND_BYTES: &str = "FMTGATE_MAX_COMMAND_BYTES";
pub const ENV_WORKING_DIR: &str = "FMTGATE_WORKING_DIR";

/// Configuration for a formatter check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatCheckConfig {
    /// Formatter executable (name on `PATH` or absolute path).
    pub executable: String,

    /// Flags that put the formatter in check-only mode. Placed before the files.
    pub check_flags: Vec<String>,

    /// Wall-clock limit for a single invocation (milliseconds).
    pub timeout_ms: u64,

    /// File extensions (without the dot) the check applies to.
    /// Empty means every file is passed through.
    pub include_extensions: Vec<String>,

    /// Upper bound on executable + flags + files per invocation, in bytes.
    pub max_command_bytes: usize,

    /// Directory the formatter runs in. Inherits the caller's when unset.
    pub working_dir: Option<PathBuf>,
}

impl Default for FormatCheckConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            check_flags: vec!["--test".to_string()],
            timeout_ms: DEFAULT_TIMEOUT_MS,
            include_extensions: Vec::new(),
            max_command_bytes: DEFAULT_MAX_COMMAND_BYTES,
            working_dir: None,
        }
    }
}

impl FormatCheckConfig {
    /// Create a config for an arbitrary check-mode command.
    pub fn new(executable: &str, check_flags: &[&str]) -> Self {
        Self {
            executable: executable.to_string(),
            check_flags: check_flags.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `FMTGATE_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `FMTGATE_*` key.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(exe) = lookup(ENV_EXECUTABLE) {
            config.executable = exe.trim().to_string();
        }
        if let Some(flags) = lookup(ENV_FLAGS) {
            config.check_flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_env(ENV_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_INCLUDE) {
            config.include_extensions = split_extensions(&raw);
        }
        if let Some(raw) = lookup(ENV_MAX_COMMAND_BYTES) {
            config.max_command_bytes = parse_env(ENV_MAX_COMMAND_BYTES, &raw)?;
        }
        if let Some(dir) = lookup(ENV_WORKING_DIR) {
            config.working_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the executable.
    pub fn with_executable(mut self, executable: &str) -> Self {
        self.executable = executable.to_string();
        self
    }

    /// Set the timeout in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Replace the include filter.
    pub fn with_include_extensions(mut self, extensions: &[&str]) -> Self {
        self.include_extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Pass every file through regardless of extension.
    pub fn include_all(mut self) -> Self {
        self.include_extensions.clear();
        self
    }

    /// Set the per-invocation command length bound.
    pub fn with_max_command_bytes(mut self, max_command_bytes: usize) -> Self {
        self.max_command_bytes = max_command_bytes;
        self
    }

    /// Run the formatter from `dir`.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Reject configurations that cannot produce a meaningful invocation.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.executable.trim().is_empty() {
            return Err(ConfigError::EmptyExecutable);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        // Without check flags scalafmt rewrites files instead of checking them.
        if self.check_flags.iter().all(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyCheckFlags);
        }
        Ok(())
    }

    /// Whether `path` passes the include filter.
    pub fn applies_to(&self, path: &str) -> bool {
        if self.include_extensions.is_empty() {
            return true;
        }
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.include_extensions
                    .iter()
                    .any(|inc| inc.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Short tool name for user-facing messages (`/opt/bin/scalafmt` -> `scalafmt`).
    pub fn tool_name(&self) -> &str {
        Path::new(&self.executable)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.executable.as_str())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, raw: &str) -> ConfigResult<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: raw.to_string(),
    })
}

fn split_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}
