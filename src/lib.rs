//! # docbatch
//!
//! Batch-convert AsciiDoc books into DocBook chapter fragments, standalone
//! HTML and PDF, running many conversions in parallel.
//!
//! The conversions themselves are done by the AsciiDoc toolchain
//! (`asciidoc` and `a2x`); this crate decides what to convert, runs the
//! toolchain on a bounded worker pool, post-processes DocBook output, and
//! reports what happened.
//!
//! ## Pipeline Overview
//!
//! ```text
//! sources (explicit or *.asciidoc)
//!  │
//!  ├─ 1. Plan     source × format tasks, source-outer
//!  ├─ 2. Submit   every task to a 16-worker pool
//!  ├─ 3. Convert  asciidoc / a2x per task (blocking, on worker threads)
//!  ├─ 4. Extract  DocBook only: keep <chapter> subtrees behind a preamble
//!  └─ 5. Join     results in submission order; first failure fails the run
//! ```
//!
//! Outputs land in `xml/`, `html/` and `pdf/` under the output root, named
//! after the source stem.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docbatch::{convert_all, BatchConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .formats(vec![OutputFormat::Docbook, OutputFormat::Html])
//!         .build()?;
//!     let summary = convert_all(&config).await?;
//!     eprintln!("{} task(s) in {}ms", summary.total_tasks, summary.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docbatch` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, OutputFormat, Toolchain};
pub use convert::{convert_all, convert_all_sync, execute, execute_with, plan_named, plan_tasks};
pub use error::BatchError;
pub use output::{BatchSummary, ConversionReport, ConversionTask, Diagnostic, Severity, TaskOutcome};
pub use pipeline::Converter;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
