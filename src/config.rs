//! Configuration types for a batch conversion run.
//!
//! Everything the dispatcher needs is carried in one [`BatchConfig`], built
//! once at startup via [`BatchConfigBuilder`] and passed by reference into
//! [`crate::convert::convert_all`]. Nothing is read from ambient globals.

use crate::error::BatchError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Number of concurrent conversion workers when none is configured.
pub const DEFAULT_WORKERS: usize = 16;

/// Glob used to discover sources when no explicit inputs are given.
pub const DEFAULT_PATTERN: &str = "*.asciidoc";

/// Icon directory handed to asciidoc for admonition icons in HTML output.
pub const DEFAULT_ICONS_DIR: &str = "/etc/asciidoc/images/icons";

/// Configuration for a batch conversion run.
///
/// # Example
/// ```rust
/// use docbatch::{BatchConfig, OutputFormat};
///
/// let config = BatchConfig::builder()
///     .formats(vec![OutputFormat::Docbook, OutputFormat::Html])
///     .workers(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.workers, 4);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Size of the worker pool. Default: 16.
    pub workers: usize,

    /// Requested output formats, in the order tasks are scheduled per source.
    /// Default: `[Docbook]`.
    pub formats: Vec<OutputFormat>,

    /// Explicit source files. When empty, sources are discovered with
    /// `pattern` inside `source_dir`.
    pub inputs: Vec<PathBuf>,

    /// Directory searched during discovery. Default: `.`.
    pub source_dir: PathBuf,

    /// Glob used for discovery. Default: `*.asciidoc`.
    pub pattern: String,

    /// Root under which the `xml/`, `html/` and `pdf/` subdirectories are
    /// written. Default: `.`.
    pub output_root: PathBuf,

    /// External programs the converters invoke.
    pub toolchain: Toolchain,

    /// Optional progress callback for scheduling and completion events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            formats: vec![OutputFormat::Docbook],
            inputs: Vec::new(),
            source_dir: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            output_root: PathBuf::from("."),
            toolchain: Toolchain::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("workers", &self.workers)
            .field("formats", &self.formats)
            .field("inputs", &self.inputs)
            .field("source_dir", &self.source_dir)
            .field("pattern", &self.pattern)
            .field("output_root", &self.output_root)
            .field("toolchain", &self.toolchain)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl BatchConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: BatchConfig::default(),
        }
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n;
        self
    }

    pub fn formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.config.formats = formats;
        self
    }

    pub fn inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.config.inputs = inputs;
        self
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.config.toolchain = toolchain;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.workers == 0 {
            return Err(BatchError::InvalidConfig("Workers must be ≥ 1".into()));
        }
        if c.formats.is_empty() {
            return Err(BatchError::InvalidConfig(
                "At least one output format is required".into(),
            ));
        }
        if c.inputs.is_empty() && c.pattern.trim().is_empty() {
            return Err(BatchError::InvalidConfig(
                "Discovery pattern must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Toolchain ────────────────────────────────────────────────────────────

/// The external programs converters shell out to.
///
/// Program names are resolved through `PATH` unless given as paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    /// The `asciidoc` processor used for HTML and DocBook output.
    pub asciidoc: PathBuf,
    /// The `a2x` driver used for PDF output (via FOP).
    pub a2x: PathBuf,
    /// Directory of admonition icons referenced by HTML output.
    pub icons_dir: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            asciidoc: PathBuf::from("asciidoc"),
            a2x: PathBuf::from("a2x"),
            icons_dir: PathBuf::from(DEFAULT_ICONS_DIR),
        }
    }
}

// ── Formats ──────────────────────────────────────────────────────────────

/// A target format. The set is closed; each variant maps to exactly one
/// converter in [`crate::pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// DocBook chapters extracted from a book-doctype render.
    Docbook,
    /// Standalone HTML page with inlined assets.
    Html,
    /// PDF rendered through a2x and FOP.
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Docbook, OutputFormat::Html, OutputFormat::Pdf];

    /// Canonical name used in logs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Docbook => "docbook",
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// Output subdirectory under the output root.
    pub fn subdir(self) -> &'static str {
        match self {
            OutputFormat::Docbook => "xml",
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// File extension of the produced artifact.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docbook => "xml",
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// `root/<subdir>/<source-stem>.<ext>`.
    ///
    /// A pure function of its arguments: the same source always lands at the
    /// same path, and distinct formats never share a directory.
    pub fn output_path(self, root: &Path, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| source.as_os_str().to_os_string());
        let mut file = stem;
        file.push(".");
        file.push(self.extension());
        root.join(self.subdir()).join(file)
    }

    /// Parse every name, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<OutputFormat>, BatchError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "docbook" | "xml" => Ok(OutputFormat::Docbook),
            "html" => Ok(OutputFormat::Html),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(BatchError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}
