//! Conversion stages for one `(source, format)` task.
//!
//! Each format has exactly one [`Converter`]; [`converter_for`] is the only
//! place a format is mapped to its implementation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ converter ──▶ toolchain ──▶ (docbook only) postprocess ──▶ file
//! (glob)    (pdf/html/    (asciidoc,     (chapter extraction)
//!            docbook)      a2x)
//! ```
//!
//! 1. [`input`]: resolve explicit sources or discover them by glob
//! 2. [`pdf`], [`html`], [`docbook`]: build the toolchain command per format
//! 3. [`toolchain`]: run it, capture diagnostics, map failures
//! 4. [`postprocess`]: cut chapters out of the DocBook book and add the preamble

pub mod docbook;
pub mod html;
pub mod input;
pub mod pdf;
pub mod postprocess;
pub mod toolchain;

use crate::config::{OutputFormat, Toolchain};
use crate::error::BatchError;
use crate::output::Diagnostic;
use std::path::Path;
use std::sync::Arc;

/// Converts one source file into one output format.
///
/// Implementations block until the artifact is on disk. They are shared
/// between workers, hence `Send + Sync`.
pub trait Converter: Send + Sync {
    /// The format this converter produces.
    fn format(&self) -> OutputFormat;

    /// Convert `source`, writing below `output_root`, and return the
    /// toolchain's diagnostics.
    fn convert(&self, source: &Path, output_root: &Path) -> Result<Vec<Diagnostic>, BatchError>;
}

/// The converter for `format`, configured from `toolchain`.
pub fn converter_for(format: OutputFormat, toolchain: &Toolchain) -> Arc<dyn Converter> {
    match format {
        OutputFormat::Docbook => Arc::new(docbook::DocbookConverter::new(toolchain)),
        OutputFormat::Html => Arc::new(html::HtmlConverter::new(toolchain)),
        OutputFormat::Pdf => Arc::new(pdf::PdfConverter::new(toolchain)),
    }
}

/// Create `dir` (and parents) if missing.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), BatchError> {
    std::fs::create_dir_all(dir).map_err(|e| BatchError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}
