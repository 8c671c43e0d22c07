//! Standalone HTML output through `asciidoc`.
//!
//! Images are inlined as data URIs, a table of contents is generated, and
//! admonitions use the icon set from [`Toolchain::icons_dir`].

use super::{ensure_dir, toolchain, Converter};
use crate::config::{OutputFormat, Toolchain};
use crate::error::BatchError;
use crate::output::Diagnostic;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct HtmlConverter {
    asciidoc: PathBuf,
    icons_dir: PathBuf,
}

impl HtmlConverter {
    pub fn new(toolchain: &Toolchain) -> Self {
        Self {
            asciidoc: toolchain.asciidoc.clone(),
            icons_dir: toolchain.icons_dir.clone(),
        }
    }

    fn command(&self, source: &Path, target: &Path) -> Command {
        let mut iconsdir = OsString::from("iconsdir=");
        iconsdir.push(&self.icons_dir);

        let mut cmd = Command::new(&self.asciidoc);
        cmd.args(["-a", "data-uri", "-a", "toc", "-a", "icons", "-a"])
            .arg(iconsdir)
            .arg("-o")
            .arg(target)
            .arg(source);
        cmd
    }
}

impl Converter for HtmlConverter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn convert(&self, source: &Path, output_root: &Path) -> Result<Vec<Diagnostic>, BatchError> {
        let target = OutputFormat::Html.output_path(output_root, source);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        let out = toolchain::run(&mut self.command(source, &target), source)?;
        Ok(out.diagnostics)
    }
}
