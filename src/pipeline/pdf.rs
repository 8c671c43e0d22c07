//! PDF output through `a2x` and Apache FOP.
//!
//! `a2x -f pdf --fop -D <root>/pdf <source>` renders the source via DocBook
//! and XSL-FO; a2x names the file after the source stem, which is exactly
//! [`OutputFormat::output_path`]. A non-zero exit fails the task.

use super::{ensure_dir, toolchain, Converter};
use crate::config::{OutputFormat, Toolchain};
use crate::error::BatchError;
use crate::output::Diagnostic;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub struct PdfConverter {
    a2x: PathBuf,
}

impl PdfConverter {
    pub fn new(toolchain: &Toolchain) -> Self {
        Self {
            a2x: toolchain.a2x.clone(),
        }
    }

    fn command(&self, source: &Path, out_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.a2x);
        cmd.args(["-f", "pdf", "--fop", "-D"]).arg(out_dir).arg(source);
        cmd
    }
}

impl Converter for PdfConverter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn convert(&self, source: &Path, output_root: &Path) -> Result<Vec<Diagnostic>, BatchError> {
        let out_dir = output_root.join(OutputFormat::Pdf.subdir());
        ensure_dir(&out_dir)?;

        let out = toolchain::run(&mut self.command(source, &out_dir), source)?;

        // a2x reports progress on stdout as well; surface both streams.
        let mut diagnostics = toolchain::parse_diagnostics(&String::from_utf8_lossy(&out.stdout));
        diagnostics.extend(out.diagnostics);
        debug!("pdf written for '{}'", source.display());
        Ok(diagnostics)
    }
}
