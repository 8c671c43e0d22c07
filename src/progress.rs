//! Progress-callback trait for batch scheduling and completion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the dispatcher schedules tasks and workers finish them. The binary uses
//! this to print the `Scheduling ...` lines, toolchain diagnostics and a
//! progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use docbatch::{BatchConfig, BatchProgressCallback, ConversionTask};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     scheduled: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_task_scheduled(&self, task: &ConversionTask) {
//!         self.scheduled.fetch_add(1, Ordering::SeqCst);
//!         println!("Scheduling {task}");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { scheduled: AtomicUsize::new(0) });
//! let config = BatchConfig::builder()
//!     .progress_callback(cb as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::BatchError;
use crate::output::{ConversionReport, ConversionTask};
use std::sync::Arc;

/// Called by the dispatcher and its workers as the batch progresses.
///
/// `on_task_complete` and `on_task_error` run on worker threads and may be
/// called concurrently; implementations must synchronise shared state.
/// Scheduling events arrive on the dispatching task, in submission order.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the task list is planned, before any submission.
    fn on_batch_start(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    /// Called just before a task is handed to the worker pool.
    fn on_task_scheduled(&self, task: &ConversionTask) {
        let _ = task;
    }

    /// Called by a worker when a conversion succeeds. The report carries the
    /// toolchain diagnostics.
    fn on_task_complete(&self, report: &ConversionReport) {
        let _ = report;
    }

    /// Called by a worker when a conversion fails.
    fn on_task_error(&self, task: &ConversionTask, error: &BatchError) {
        let _ = (task, error);
    }

    /// Called once every submitted task has resolved.
    fn on_batch_complete(&self, total_tasks: usize, succeeded: usize) {
        let _ = (total_tasks, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
