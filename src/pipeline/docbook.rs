//! DocBook chapter fragments through `asciidoc` and [`super::postprocess`].
//!
//! The book is rendered to stdout (`-o -`) rather than to a file, then cut
//! down to its chapters in memory. The fragment is written to a uniquely
//! named temporary sibling and persisted over the target, so a parse or
//! write failure never leaves a half-written `.xml` (or a stray temp file)
//! behind.

use super::{ensure_dir, postprocess, toolchain, Converter};
use crate::config::{OutputFormat, Toolchain};
use crate::error::BatchError;
use crate::output::Diagnostic;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

pub struct DocbookConverter {
    asciidoc: PathBuf,
}

impl DocbookConverter {
    pub fn new(toolchain: &Toolchain) -> Self {
        Self {
            asciidoc: toolchain.asciidoc.clone(),
        }
    }

    fn command(&self, source: &Path) -> Command {
        let mut cmd = Command::new(&self.asciidoc);
        cmd.args(["-b", "docbook", "-d", "book", "-o", "-"]).arg(source);
        cmd
    }
}

impl Converter for DocbookConverter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docbook
    }

    fn convert(&self, source: &Path, output_root: &Path) -> Result<Vec<Diagnostic>, BatchError> {
        let out = toolchain::run(&mut self.command(source), source)?;
        debug!(
            "asciidoc produced {} bytes of DocBook for '{}'",
            out.stdout.len(),
            source.display()
        );

        let fragment = postprocess::book_to_fragment(&out.stdout)?;
        let target = OutputFormat::Docbook.output_path(output_root, source);
        write_atomic(&target, &fragment)?;
        Ok(out.diagnostics)
    }
}

/// Write to a fresh temp file next to `path`, then persist it over `path`.
/// The temp file is deleted if any step fails.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BatchError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;
    let write_err = |e| BatchError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
