//! Task, report and summary types produced by a batch run.

use crate::config::OutputFormat;
use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One `(source, format)` unit of work.
///
/// Created by the dispatcher for every combination of input and requested
/// format, consumed exactly once by a converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionTask {
    /// The AsciiDoc source file.
    pub source: PathBuf,
    /// Target format.
    pub format: OutputFormat,
}

impl ConversionTask {
    pub fn new(source: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            source: source.into(),
            format,
        }
    }
}

impl fmt::Display for ConversionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' -> '{}'", self.source.display(), self.format)
    }
}

/// Severity of a toolchain diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Deprecated,
    Info,
}

/// A message the toolchain printed while converting. Never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The full line as printed by the tool.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of one successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub task: ConversionTask,
    /// Where the artifact was written.
    pub output: PathBuf,
    /// Diagnostics surfaced by the toolchain, in the order printed.
    pub diagnostics: Vec<Diagnostic>,
    /// Wall-clock time spent in the converter.
    pub duration_ms: u64,
}

/// What became of one submitted task.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: ConversionTask,
    pub result: Result<ConversionReport, BatchError>,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a fully successful batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Reports in submission order.
    pub reports: Vec<ConversionReport>,
    /// Number of tasks scheduled.
    pub total_tasks: usize,
    /// Wall-clock time of the whole run.
    pub total_duration_ms: u64,
}

impl BatchSummary {
    /// Number of diagnostics across all reports.
    pub fn diagnostic_count(&self) -> usize {
        self.reports.iter().map(|r| r.diagnostics.len()).sum()
    }
}
