//! Formatter output parsing.
//!
//! Turns scalafmt-style report lines such as
//! `[error] src/A.scala has changes after scalafmt` into structured
//! [`FormatDiagnostic`] entries. Purely cosmetic: a failing exit status is a
//! failure whether or not any line matches.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Severity tag reported by the formatter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the formatter reported as not conforming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FormatDiagnostic {
    pub severity: Severity,

    /// Path exactly as the formatter printed it.
    pub file: String,
}

impl fmt::Display for FormatDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.file)
    }
}

fn message_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[(?P<type>error|warn)\]\s+(?P<file>.*) has changes after scalafmt$")
            .expect("diagnostic pattern is a valid regex")
    })
}

/// Parse a single output line.
pub fn parse_line(line: &str) -> Option<FormatDiagnostic> {
    let line = line.trim_end_matches('\r');
    let caps = message_regex().captures(line)?;

    let severity = match &caps["type"] {
        "error" => Severity::Error,
        _ => Severity::Warn,
    };
    let file = caps["file"].trim();
    if file.is_empty() {
        return None;
    }

    Some(FormatDiagnostic {
        severity,
        file: file.to_string(),
    })
}

/// Parse every matching line of `output`, dropping repeats but keeping first-seen order.
pub fn parse_output(output: &str) -> Vec<FormatDiagnostic> {
    let mut diagnostics: Vec<FormatDiagnostic> = Vec::new();
    for diag in output.lines().filter_map(parse_line) {
        if !diagnostics.contains(&diag) {
            diagnostics.push(diag);
        }
    }
    diagnostics
}
