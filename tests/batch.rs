//! End-to-end tests for docbatch against a fake AsciiDoc toolchain.
//!
//! The real `asciidoc`/`a2x` are rarely installed in CI, so the tests run
//! small shell scripts that behave like them (see `common`).
//!
//! Run with:
//!   cargo test --test batch

#![cfg(unix)]

mod common;

use common::THREE_CHAPTERS;
use docbatch::pipeline::postprocess::DOCBOOK_PREAMBLE;
use docbatch::{
    convert_all, BatchConfig, BatchError, BatchProgressCallback, ConversionReport,
    ConversionTask, OutputFormat, ProgressCallback, Severity, Toolchain,
};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

static FAKE_TOOLCHAIN: Lazy<Toolchain> = Lazy::new(|| common::install_fake_toolchain("batch"));

struct Workspace {
    dir: TempDir,
    toolchain: Toolchain,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            toolchain: FAKE_TOOLCHAIN.clone(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn source(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn config(&self) -> docbatch::BatchConfigBuilder {
        BatchConfig::builder()
            .output_root(self.root().join("out"))
            .source_dir(self.root())
            .toolchain(self.toolchain.clone())
    }
}

#[derive(Default)]
struct Recorder {
    scheduled: Mutex<Vec<String>>,
    completed: Mutex<Vec<ConversionReport>>,
    errors: Mutex<Vec<String>>,
}

impl BatchProgressCallback for Recorder {
    fn on_task_scheduled(&self, task: &ConversionTask) {
        self.scheduled
            .lock()
            .unwrap()
            .push(format!("Scheduling {task}"));
    }

    fn on_task_complete(&self, report: &ConversionReport) {
        self.completed.lock().unwrap().push(report.clone());
    }

    fn on_task_error(&self, task: &ConversionTask, _error: &BatchError) {
        self.errors.lock().unwrap().push(task.to_string());
    }
}

// ── DocBook ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn docbook_output_is_preamble_plus_chapters() {
    let ws = Workspace::new();
    let src = ws.source("book.asciidoc", THREE_CHAPTERS);

    let config = ws.config().inputs(vec![src]).build().unwrap();
    let summary = convert_all(&config).await.expect("run should succeed");

    assert_eq!(summary.total_tasks, 1);
    let out = ws.root().join("out/xml/book.xml");
    assert_eq!(summary.reports[0].output, out);

    let written = std::fs::read_to_string(&out).unwrap();
    let expected = format!(
        "{DOCBOOK_PREAMBLE}{}{}{}",
        "<chapter id=\"c1\"><title>One</title></chapter>\n",
        "<chapter id=\"c2\"><title>Two</title></chapter>\n",
        "<chapter id=\"c3\"><title>Three</title></chapter>\n",
    );
    assert_eq!(written, expected);
}

#[tokio::test]
async fn docbook_without_chapters_writes_preamble_only() {
    let ws = Workspace::new();
    let src = ws.source("empty.asciidoc", "<book><preface/></book>");

    let config = ws.config().inputs(vec![src]).build().unwrap();
    convert_all(&config).await.unwrap();

    let written = std::fs::read_to_string(ws.root().join("out/xml/empty.xml")).unwrap();
    assert_eq!(written, DOCBOOK_PREAMBLE);
}

#[tokio::test]
async fn malformed_docbook_fails_the_run_without_output() {
    let ws = Workspace::new();
    let src = ws.source("broken.asciidoc", "<book><chapter></book>");

    let config = ws.config().inputs(vec![src]).build().unwrap();
    let err = convert_all(&config).await.unwrap_err();

    assert!(matches!(err.root(), BatchError::MalformedXml { .. }), "got: {err}");
    assert!(!ws.root().join("out/xml/broken.xml").exists());
}

#[tokio::test]
async fn rerun_overwrites_the_same_paths() {
    let ws = Workspace::new();
    let src = ws.source("book.asciidoc", THREE_CHAPTERS);
    let config = ws
        .config()
        .inputs(vec![src])
        .formats(vec![OutputFormat::Docbook, OutputFormat::Html])
        .build()
        .unwrap();

    let first = convert_all(&config).await.unwrap();
    let second = convert_all(&config).await.unwrap();
    let paths = |s: &docbatch::BatchSummary| s.reports.iter().map(|r| r.output.clone()).collect::<Vec<_>>();
    assert_eq!(paths(&first), paths(&second));
}

// ── HTML / PDF ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_format_for_every_discovered_source() {
    let ws = Workspace::new();
    ws.source("a.asciidoc", THREE_CHAPTERS);
    ws.source("b.asciidoc", THREE_CHAPTERS);
    ws.source("ignored.txt", "not a source");

    let recorder = Arc::new(Recorder::default());
    let config = ws
        .config()
        .formats(vec![OutputFormat::Docbook, OutputFormat::Html, OutputFormat::Pdf])
        .progress_callback(recorder.clone() as ProgressCallback)
        .build()
        .unwrap();

    let summary = convert_all(&config).await.unwrap();
    assert_eq!(summary.total_tasks, 6);

    for stem in ["a", "b"] {
        assert!(ws.root().join(format!("out/xml/{stem}.xml")).is_file());
        assert!(ws.root().join(format!("out/html/{stem}.html")).is_file());
        assert!(ws.root().join(format!("out/pdf/{stem}.pdf")).is_file());
    }

    let scheduled = recorder.scheduled.lock().unwrap().clone();
    assert_eq!(scheduled.len(), 6);
    let a = ws.root().join("a.asciidoc");
    assert_eq!(scheduled[0], format!("Scheduling '{}' -> 'docbook'", a.display()));
    assert_eq!(scheduled[1], format!("Scheduling '{}' -> 'html'", a.display()));
    assert_eq!(scheduled[2], format!("Scheduling '{}' -> 'pdf'", a.display()));
    assert!(scheduled[3].contains("b.asciidoc"));
}

#[tokio::test]
async fn diagnostics_are_surfaced_not_fatal() {
    let ws = Workspace::new();
    let src = ws.source("warn.asciidoc", THREE_CHAPTERS);
    let recorder = Arc::new(Recorder::default());
    let config = ws
        .config()
        .inputs(vec![src])
        .formats(vec![OutputFormat::Html])
        .progress_callback(recorder.clone() as ProgressCallback)
        .build()
        .unwrap();

    let summary = convert_all(&config).await.unwrap();
    let report = &summary.reports[0];
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);
    assert!(report.diagnostics[0].message.contains("fake warning"));
    assert_eq!(recorder.completed.lock().unwrap().len(), 1);

    let html = std::fs::read_to_string(ws.root().join("out/html/warn.html")).unwrap();
    assert!(html.starts_with("<html>"));
}

// ── Failure semantics ────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_pdf_fails_run_but_other_tasks_complete() {
    let ws = Workspace::new();
    let bad = ws.source("fail.asciidoc", THREE_CHAPTERS);
    let good = ws.source("good.asciidoc", THREE_CHAPTERS);

    let recorder = Arc::new(Recorder::default());
    let config = ws
        .config()
        .inputs(vec![bad.clone(), good])
        .formats(vec![OutputFormat::Pdf, OutputFormat::Html])
        .progress_callback(recorder.clone() as ProgressCallback)
        .build()
        .unwrap();

    let err = convert_all(&config).await.unwrap_err();
    match &err {
        BatchError::TaskFailed { path, format, source } => {
            assert_eq!(path, &bad);
            assert_eq!(*format, OutputFormat::Pdf);
            assert!(
                matches!(**source, BatchError::ToolFailed { code: Some(1), .. }),
                "got: {source}"
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    // Everything scheduled, later tasks still ran.
    assert_eq!(recorder.scheduled.lock().unwrap().len(), 4);
    assert!(ws.root().join("out/html/good.html").is_file());
    assert!(ws.root().join("out/pdf/good.pdf").is_file());
    assert_eq!(recorder.errors.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_explicit_input_fails_before_scheduling() {
    let ws = Workspace::new();
    let recorder = Arc::new(Recorder::default());
    let config = ws
        .config()
        .inputs(vec![ws.root().join("nope.asciidoc")])
        .progress_callback(recorder.clone() as ProgressCallback)
        .build()
        .unwrap();

    let err = convert_all(&config).await.unwrap_err();
    assert!(matches!(err, BatchError::SourceNotFound { .. }));
    assert!(recorder.scheduled.lock().unwrap().is_empty());
}

#[test]
fn unknown_format_name_fails_before_any_output() {
    let ws = Workspace::new();
    let src = ws.source("book.asciidoc", THREE_CHAPTERS);

    let err = docbatch::plan_named(&[src], &["docbook", "epub"]).unwrap_err();
    assert!(matches!(err, BatchError::UnknownFormat { ref name } if name == "epub"));
    assert!(!ws.root().join("out").exists());
}

#[test]
fn missing_toolchain_is_a_launch_failure() {
    let ws = Workspace::new();
    let src = ws.source("book.asciidoc", THREE_CHAPTERS);
    let config = ws
        .config()
        .inputs(vec![src])
        .toolchain(Toolchain {
            asciidoc: ws.root().join("not-installed"),
            ..ws.toolchain.clone()
        })
        .build()
        .unwrap();

    let err = docbatch::convert_all_sync(&config).unwrap_err();
    assert!(matches!(err.root(), BatchError::ToolLaunchFailed { .. }), "got: {err}");
}

#[tokio::test]
async fn empty_discovery_succeeds_with_no_tasks() {
    let ws = Workspace::new();
    ws.source("notes.txt", "not a source");
    let recorder = Arc::new(Recorder::default());
    let config = ws
        .config()
        .progress_callback(recorder.clone() as ProgressCallback)
        .build()
        .unwrap();

    let summary = convert_all(&config).await.expect("empty run should succeed");
    assert_eq!(summary.total_tasks, 0);
    assert!(summary.reports.is_empty());
    assert!(recorder.scheduled.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_docbook_formats_write_once() {
    let ws = Workspace::new();
    let src = ws.source("book.asciidoc", THREE_CHAPTERS);
    let recorder = Arc::new(Recorder::default());
    let formats = OutputFormat::parse_all(&["docbook", "xml", "docbook", "xml"]).unwrap();
    let config = ws
        .config()
        .inputs(vec![src.clone(), src])
        .formats(formats)
        .progress_callback(recorder.clone() as ProgressCallback)
        .build()
        .unwrap();

    for _ in 0..10 {
        let summary = convert_all(&config).await.expect("duplicates must not race");
        assert_eq!(summary.total_tasks, 1);
    }
    assert_eq!(recorder.scheduled.lock().unwrap().len(), 10);

    let xml_dir = ws.root().join("out/xml");
    let names: Vec<_> = std::fs::read_dir(&xml_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("book.xml")]);
}
