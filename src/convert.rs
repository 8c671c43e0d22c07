//! Batch dispatch: plan every `(source, format)` task, run them on the
//! worker pool, and collect the results.
//!
//! ## Ordering and failure
//!
//! Tasks are planned source-outer, format-inner and submitted in that order.
//! Every task is submitted before any result is awaited, so a failing task
//! never stops later ones from being scheduled or from running to
//! completion. Results are then joined in submission order; once all of them
//! have resolved, [`convert_all`] returns the first failure in *submission*
//! order, even when a later task failed earlier in wall-clock time.
//!
//! Format lookup happens for the whole plan before the first submission, so
//! a missing converter fails the run with nothing dispatched.

use crate::config::{BatchConfig, OutputFormat, Toolchain};
use crate::error::BatchError;
use crate::output::{BatchSummary, ConversionReport, ConversionTask, Severity, TaskOutcome};
use crate::pipeline::{converter_for, input, Converter};
use crate::pool::WorkerPool;
use crate::progress::ProgressCallback;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Converters keyed by the format they produce.
pub type ConverterMap = HashMap<OutputFormat, Arc<dyn Converter>>;

/// One converter per format, configured from `toolchain`.
pub fn default_converters(toolchain: &Toolchain) -> ConverterMap {
    OutputFormat::ALL
        .into_iter()
        .map(|f| (f, converter_for(f, toolchain)))
        .collect()
}

/// Every `(source, format)` pair, source-outer and format-inner.
///
/// A pair that repeats (`docbook,xml`, or the same input listed twice) is
/// kept at its first position only; two tasks must never share an output.
pub fn plan_tasks(inputs: &[PathBuf], formats: &[OutputFormat]) -> Vec<ConversionTask> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .flat_map(|src| formats.iter().map(move |&f| ConversionTask::new(src.clone(), f)))
        .filter(|task| {
            let fresh = seen.insert(task.clone());
            if !fresh {
                debug!("Skipping duplicate task {}", task);
            }
            fresh
        })
        .collect()
}

/// Like [`plan_tasks`], but from format names. Any unknown name fails the
/// whole plan.
pub fn plan_named<S: AsRef<str>>(
    inputs: &[PathBuf],
    format_names: &[S],
) -> Result<Vec<ConversionTask>, BatchError> {
    let formats = OutputFormat::parse_all(format_names)?;
    Ok(plan_tasks(inputs, &formats))
}

/// Resolve inputs, run every task and summarise.
///
/// # Errors
/// Input resolution errors are returned before anything is scheduled.
/// Otherwise, after every task has resolved, the first failed task in
/// submission order is returned as [`BatchError::TaskFailed`].
pub async fn convert_all(config: &BatchConfig) -> Result<BatchSummary, BatchError> {
    let total_start = Instant::now();
    let inputs = input::resolve_inputs(config)?;
    let tasks = plan_tasks(&inputs, &config.formats);
    info!(
        "Planned {} task(s): {} source(s) × {} format(s)",
        tasks.len(),
        inputs.len(),
        config.formats.len()
    );

    let outcomes = execute(tasks, config).await?;
    summarise(outcomes, total_start)
}

/// Synchronous wrapper around [`convert_all`].
///
/// Creates a tokio runtime internally.
pub fn convert_all_sync(config: &BatchConfig) -> Result<BatchSummary, BatchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BatchError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_all(config))
}

/// Run `tasks` with the default converters.
pub async fn execute(
    tasks: Vec<ConversionTask>,
    config: &BatchConfig,
) -> Result<Vec<TaskOutcome>, BatchError> {
    execute_with(tasks, config, &default_converters(&config.toolchain)).await
}

/// Run `tasks` with the given converters and return one outcome per task,
/// in submission order.
///
/// Only dispatch-level problems (missing converter, pool failure) are
/// returned as `Err`; task failures are inside the outcomes.
pub async fn execute_with(
    tasks: Vec<ConversionTask>,
    config: &BatchConfig,
    converters: &ConverterMap,
) -> Result<Vec<TaskOutcome>, BatchError> {
    // Lookup first: a missing converter must fail before anything runs.
    let mut plan = Vec::with_capacity(tasks.len());
    for task in tasks {
        let converter = converters
            .get(&task.format)
            .cloned()
            .ok_or_else(|| BatchError::UnknownFormat {
                name: task.format.to_string(),
            })?;
        plan.push((task, converter));
    }

    let total = plan.len();
    let callback = config.progress_callback.clone();
    if let Some(ref cb) = callback {
        cb.on_batch_start(total);
    }

    let pool = WorkerPool::new(config.workers)?;
    debug!("Worker pool started with {} worker(s)", pool.size());

    let mut handles = Vec::with_capacity(total);
    for (task, converter) in plan {
        info!("Scheduling {}", task);
        if let Some(ref cb) = callback {
            cb.on_task_scheduled(&task);
        }
        let job_task = task.clone();
        let root = config.output_root.clone();
        let cb = callback.clone();
        let handle = pool.submit(move || run_task(converter.as_ref(), job_task, &root, cb.as_ref()))?;
        handles.push((task, handle));
    }

    let mut outcomes = Vec::with_capacity(total);
    for (task, handle) in handles {
        let result = match handle.join().await {
            Ok(result) => result,
            Err(e) => {
                if let Some(ref cb) = callback {
                    cb.on_task_error(&task, &e);
                }
                Err(e)
            }
        };
        outcomes.push(TaskOutcome { task, result });
    }
    pool.shutdown().await;

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    if let Some(ref cb) = callback {
        cb.on_batch_complete(total, succeeded);
    }
    info!("Batch finished: {}/{} task(s) succeeded", succeeded, total);

    Ok(outcomes)
}

/// Body of one pool job.
fn run_task(
    converter: &dyn Converter,
    task: ConversionTask,
    output_root: &Path,
    callback: Option<&ProgressCallback>,
) -> Result<ConversionReport, BatchError> {
    let start = Instant::now();
    match converter.convert(&task.source, output_root) {
        Ok(diagnostics) => {
            for d in &diagnostics {
                match d.severity {
                    Severity::Error | Severity::Warning => warn!("{}: {}", task, d),
                    Severity::Deprecated | Severity::Info => debug!("{}: {}", task, d),
                }
            }
            let report = ConversionReport {
                output: task.format.output_path(output_root, &task.source),
                task,
                diagnostics,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            debug!("Finished {} in {}ms", report.task, report.duration_ms);
            if let Some(cb) = callback {
                cb.on_task_complete(&report);
            }
            Ok(report)
        }
        Err(e) => {
            warn!("Failed {}: {}", task, e);
            if let Some(cb) = callback {
                cb.on_task_error(&task, &e);
            }
            Err(e)
        }
    }
}

/// Fold outcomes into a summary, or the first submission-order failure.
fn summarise(outcomes: Vec<TaskOutcome>, started: Instant) -> Result<BatchSummary, BatchError> {
    let total_tasks = outcomes.len();
    let mut reports = Vec::with_capacity(total_tasks);
    let mut first_error: Option<BatchError> = None;

    for outcome in outcomes {
        match outcome.result {
            Ok(report) => reports.push(report),
            Err(e) => {
                let wrapped = BatchError::TaskFailed {
                    path: outcome.task.source,
                    format: outcome.task.format,
                    source: Box::new(e),
                };
                if first_error.is_none() {
                    first_error = Some(wrapped);
                } else {
                    debug!("Additional failure: {}", wrapped);
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    Ok(BatchSummary {
        reports,
        total_tasks,
        total_duration_ms: started.elapsed().as_millis() as u64,
    })
}
