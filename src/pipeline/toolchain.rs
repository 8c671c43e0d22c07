//! Running external toolchain programs.
//!
//! Every converter ends up here: build a [`Command`], run it to completion
//! with both streams captured, turn stderr into [`Diagnostic`]s, and map a
//! launch failure or a non-zero exit onto [`BatchError`]. Calls block; the
//! worker pool runs them on tokio's blocking threads.

use crate::error::BatchError;
use crate::output::{Diagnostic, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Captured result of a successful tool run.
#[derive(Debug, Default)]
pub struct ToolOutput {
    /// Raw stdout. Holds the document when the tool writes to `-`.
    pub stdout: Vec<u8>,
    /// Lines the tool printed to stderr.
    pub diagnostics: Vec<Diagnostic>,
}

/// Run `cmd` on behalf of `source` and wait for it.
///
/// # Errors
/// * [`BatchError::ToolLaunchFailed`] if the program cannot be spawned.
/// * [`BatchError::ToolFailed`] if it exits non-zero or is killed; the
///   captured diagnostics travel with the error.
pub fn run(cmd: &mut Command, source: &Path) -> Result<ToolOutput, BatchError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!("running {cmd:?}");

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| BatchError::ToolLaunchFailed {
            program: program.clone(),
            source: e,
        })?;

    let diagnostics = parse_diagnostics(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        warn!(
            "{} exited with {:?} on '{}'",
            program,
            output.status.code(),
            source.display()
        );
        return Err(BatchError::ToolFailed {
            program,
            path: source.to_path_buf(),
            code: output.status.code(),
            messages: diagnostics.into_iter().map(|d| d.message).collect(),
        });
    }

    Ok(ToolOutput {
        stdout: output.stdout,
        diagnostics,
    })
}

// asciidoc and a2x prefix their messages with `<prog>: <SEVERITY>: `.
static RE_SEVERITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.\-]+:\s+(ERROR|FAILED|WARNING|DEPRECATED|INFO)\b").unwrap()
});

/// Split tool output into one [`Diagnostic`] per non-blank line.
pub fn parse_diagnostics(text: &str) -> Vec<Diagnostic> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| Diagnostic {
            severity: classify(line),
            message: line.to_string(),
        })
        .collect()
}

fn classify(line: &str) -> Severity {
    match RE_SEVERITY.captures(line.trim_start()) {
        Some(caps) => match &caps[1] {
            "ERROR" | "FAILED" => Severity::Error,
            "WARNING" => Severity::Warning,
            "DEPRECATED" => Severity::Deprecated,
            _ => Severity::Info,
        },
        None => Severity::Info,
    }
}
