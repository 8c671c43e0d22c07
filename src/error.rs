//! Error types for the docbatch library.
//!
//! A single enum, [`BatchError`], covers every failure in a run. Errors
//! raised inside one conversion task are wrapped in
//! [`BatchError::TaskFailed`] by the dispatcher so the caller knows which
//! `(source, format)` pair broke, while the underlying cause stays reachable
//! through [`std::error::Error::source`].
//!
//! Nothing in the library recovers locally: converters return the error,
//! the dispatcher records it, and the first failure in submission order
//! becomes the result of the whole run.

use crate::config::OutputFormat;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docbatch library.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// An explicitly listed source file does not exist.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// A requested format name has no converter.
    #[error("Unknown output format '{name}' (expected one of: docbook, xml, html, pdf)")]
    UnknownFormat { name: String },

    /// The discovery glob pattern is not valid.
    #[error("Invalid discovery pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    // ── Toolchain errors ──────────────────────────────────────────────────
    /// The external program could not be started at all.
    #[error("Failed to launch '{program}': {source}\nIs it installed and on PATH?")]
    ToolLaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but exited unsuccessfully.
    #[error("'{program}' failed on '{path}' ({}){}", exit_label(.code), diagnostics_suffix(.messages))]
    ToolFailed {
        program: String,
        path: PathBuf,
        code: Option<i32>,
        messages: Vec<String>,
    },

    // ── Post-processing errors ────────────────────────────────────────────
    /// The DocBook buffer is not well-formed XML.
    #[error("Malformed DocBook output at byte {position}: {detail}")]
    MalformedXml { position: u64, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Dispatch errors ───────────────────────────────────────────────────
    /// A scheduled task failed; `source` is the converter's error.
    #[error("Conversion of '{path}' -> '{format}' failed: {source}")]
    TaskFailed {
        path: PathBuf,
        format: OutputFormat,
        #[source]
        source: Box<BatchError>,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (a worker panicked, the runtime went away).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BatchError {
    /// The innermost error, looking through any [`BatchError::TaskFailed`] wrapper.
    pub fn root(&self) -> &BatchError {
        match self {
            BatchError::TaskFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

fn diagnostics_suffix(messages: &[String]) -> String {
    if messages.is_empty() {
        String::new()
    } else {
        format!("\n  {}", messages.join("\n  "))
    }
}
