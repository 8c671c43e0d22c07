//! CLI binary for docbatch.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`,
//! prints scheduling lines and toolchain diagnostics, and exits non-zero when
//! any task fails.

use anyhow::{Context, Result};
use clap::Parser;
use docbatch::{
    convert_all, BatchConfig, BatchError, BatchProgressCallback, ConversionReport,
    ConversionTask, OutputFormat, ProgressCallback, Severity, Toolchain,
};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

/// Escapes only when both streams we print to are terminals.
static COLOUR: Lazy<bool> = Lazy::new(|| io::stdout().is_terminal() && io::stderr().is_terminal());

fn paint(code: &str, s: &str) -> String {
    if *COLOUR {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}
fn green(s: &str) -> String {
    paint("32", s)
}
fn red(s: &str) -> String {
    paint("31", s)
}
fn yellow(s: &str) -> String {
    paint("33", s)
}
fn dim(s: &str) -> String {
    paint("2", s)
}
fn bold(s: &str) -> String {
    paint("1", s)
}

// ── Console progress callback ────────────────────────────────────────────────

/// Prints scheduling lines and diagnostics, optionally above an indicatif
/// bar counting finished tasks. Worker threads call into this concurrently;
/// indicatif and the atomics take care of synchronisation.
struct ConsoleProgress {
    bar: Option<ProgressBar>,
    /// Keep stdout clean for `--json`.
    to_stderr: bool,
    quiet: bool,
    failed: AtomicUsize,
}

impl ConsoleProgress {
    fn new(show_bar: bool, to_stderr: bool, quiet: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} tasks  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Converting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self {
            bar,
            to_stderr,
            quiet,
            failed: AtomicUsize::new(0),
        })
    }

    fn emit(&self, line: String) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ if self.to_stderr => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    fn tick(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl BatchProgressCallback for ConsoleProgress {
    fn on_batch_start(&self, total_tasks: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total_tasks as u64);
        }
    }

    fn on_task_scheduled(&self, task: &ConversionTask) {
        self.emit(format!("Scheduling {task}"));
    }

    fn on_task_complete(&self, report: &ConversionReport) {
        for d in &report.diagnostics {
            let line = match d.severity {
                Severity::Error => red(&d.message),
                Severity::Warning => yellow(&d.message),
                Severity::Deprecated | Severity::Info => d.message.clone(),
            };
            self.emit(line);
        }
        self.emit(format!(
            "  {} {}  {}",
            green("✓"),
            report.output.display(),
            dim(&format!("{:.1}s", report.duration_ms as f64 / 1000.0)),
        ));
        self.tick();
    }

    fn on_task_error(&self, task: &ConversionTask, error: &BatchError) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        // Errors are shown even in quiet mode.
        let line = format!("  {} {}  {}", red("✗"), task, red(&error.to_string()));
        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ => eprintln!("{line}"),
        }
        self.tick();
    }

    fn on_batch_complete(&self, total_tasks: usize, succeeded: usize) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        if self.quiet {
            return;
        }
        let failed = self.failed.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} tasks converted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} tasks converted  ({} failed)",
                red("✘"),
                bold(&succeeded.to_string()),
                total_tasks,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every *.asciidoc in the current directory to DocBook chapters (xml/)
  docbatch

  # HTML and PDF for two books
  docbatch -f html -f pdf -i intro.asciidoc reference.asciidoc

  # Write outputs somewhere else, with fewer workers
  docbatch -f docbook,html -C build -j 4

  # Machine-readable summary
  docbatch --json > summary.json

FORMATS:
  Name            Output                 Tool
  ──────────────  ─────────────────────  ─────────────────────────────
  docbook, xml    xml/<stem>.xml         asciidoc -b docbook -d book
  html            html/<stem>.html       asciidoc (data-uri, toc, icons)
  pdf             pdf/<stem>.pdf         a2x -f pdf --fop

ENVIRONMENT VARIABLES:
  DOCBATCH_FORMATS        Comma-separated formats
  DOCBATCH_OUTPUT_DIR     Output root
  DOCBATCH_WORKERS        Worker pool size
  DOCBATCH_ASCIIDOC       asciidoc program
  DOCBATCH_A2X            a2x program
  DOCBATCH_ICONS_DIR      Admonition icon directory
  RUST_LOG                Overrides the log filter
"#;

/// Convert AsciiDoc books to DocBook, HTML and PDF in parallel.
#[derive(Parser, Debug)]
#[command(
    name = "docbatch",
    version,
    about = "Convert AsciiDoc books to DocBook, HTML and PDF in parallel",
    long_about = "Runs the AsciiDoc toolchain over every source and requested format on a \
bounded worker pool. DocBook output is reduced to the book's chapters behind a fixed \
preamble. Exits non-zero if any conversion fails.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Output format(s): docbook (alias xml), html, pdf. Repeatable. Default: docbook.
    #[arg(short, long = "formats", env = "DOCBATCH_FORMATS", value_delimiter = ',',
          value_parser = parse_format)]
    formats: Vec<OutputFormat>,

    /// Source files. Default: every file matching --pattern in --source-dir.
    #[arg(short, long = "input", value_name = "FILES", num_args = 1..)]
    input: Vec<PathBuf>,

    /// Directory searched when no --input is given.
    #[arg(long, env = "DOCBATCH_SOURCE_DIR", default_value = ".")]
    source_dir: PathBuf,

    /// Glob used when no --input is given.
    #[arg(long, env = "DOCBATCH_PATTERN", default_value = docbatch::config::DEFAULT_PATTERN)]
    pattern: String,

    /// Root for the xml/, html/ and pdf/ output directories.
    #[arg(short = 'C', long, env = "DOCBATCH_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Number of concurrent conversions.
    #[arg(short = 'j', long, env = "DOCBATCH_WORKERS",
          default_value_t = docbatch::config::DEFAULT_WORKERS)]
    workers: usize,

    /// asciidoc program.
    #[arg(long, env = "DOCBATCH_ASCIIDOC", default_value = "asciidoc")]
    asciidoc: PathBuf,

    /// a2x program.
    #[arg(long, env = "DOCBATCH_A2X", default_value = "a2x")]
    a2x: PathBuf,

    /// Admonition icon directory for HTML output.
    #[arg(long, env = "DOCBATCH_ICONS_DIR", default_value = docbatch::config::DEFAULT_ICONS_DIR)]
    icons_dir: PathBuf,

    /// Print a JSON summary on stdout when the run succeeds.
    #[arg(long, env = "DOCBATCH_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOCBATCH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCBATCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCBATCH_QUIET")]
    quiet: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, BatchError> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The console callback already prints scheduling lines and diagnostics,
    // so library logs stay at warn unless asked for.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    // indicatif hides itself off a terminal and would swallow `println`s.
    let show_bar = !cli.quiet && !cli.no_progress && !cli.verbose && io::stderr().is_terminal();
    let progress = ConsoleProgress::new(show_bar, cli.json, cli.quiet);

    let config = build_config(&cli, progress)?;

    let summary = convert_all(&config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "   {} outputs  /  {} diagnostics  /  {}ms total",
            dim(&summary.reports.len().to_string()),
            dim(&summary.diagnostic_count().to_string()),
            summary.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Arc<ConsoleProgress>) -> Result<BatchConfig> {
    let formats = if cli.formats.is_empty() {
        vec![OutputFormat::Docbook]
    } else {
        cli.formats.clone()
    };

    let toolchain = Toolchain {
        asciidoc: cli.asciidoc.clone(),
        a2x: cli.a2x.clone(),
        icons_dir: cli.icons_dir.clone(),
    };

    BatchConfig::builder()
        .formats(formats)
        .inputs(cli.input.clone())
        .source_dir(&cli.source_dir)
        .pattern(&cli.pattern)
        .output_root(&cli.output_dir)
        .workers(cli.workers)
        .toolchain(toolchain)
        .progress_callback(progress as ProgressCallback)
        .build()
        .context("Invalid configuration")
}
