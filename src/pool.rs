//! Fixed-size worker pool for blocking conversion jobs.
//!
//! `size` worker tasks drain one shared queue. Each worker takes a job, runs
//! it on tokio's blocking thread pool and waits for it before taking the
//! next, so at most `size` jobs run at any moment no matter how many are
//! queued. Submitting never blocks; every submission returns a
//! [`TaskHandle`] that resolves once the job has run.
//!
//! There is no cancellation. A job that hangs occupies its worker until it
//! returns.

use crate::error::BatchError;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;
type Queue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// A bounded pool of workers. Must be created inside a tokio runtime.
pub struct WorkerPool {
    sender: mpsc::UnboundedSender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers.
    pub fn new(size: usize) -> Result<Self, BatchError> {
        if size == 0 {
            return Err(BatchError::InvalidConfig(
                "Worker pool needs at least one worker".into(),
            ));
        }
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let queue: Queue = Arc::new(Mutex::new(receiver));
        let workers = (0..size)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&queue))))
            .collect();
        Ok(Self { sender, workers })
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue `job` and return a handle to its result.
    pub fn submit<F, T>(&self, job: F) -> Result<TaskHandle<T>, BatchError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            // The handle may have been dropped; the job still ran.
            let _ = tx.send(job());
        });
        self.sender
            .send(job)
            .map_err(|_| BatchError::Internal("worker pool is shut down".into()))?;
        Ok(TaskHandle { rx })
    }

    /// Close the queue and wait until every worker has drained it and exited.
    pub async fn shutdown(self) {
        drop(self.sender);
        for result in join_all(self.workers).await {
            if let Err(e) = result {
                warn!("worker task ended abnormally: {e}");
            }
        }
    }
}

async fn worker_loop(id: usize, queue: Queue) {
    loop {
        let job = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(job) = job else { break };
        if let Err(e) = tokio::task::spawn_blocking(job).await {
            warn!("worker {id}: job panicked: {e}");
        }
    }
    trace!("worker {id} exiting");
}

/// Completion signal for one submitted job.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the job's result. A job that panicked reports
    /// [`BatchError::Internal`].
    pub async fn join(self) -> Result<T, BatchError> {
        self.rx
            .await
            .map_err(|_| BatchError::Internal("task panicked before reporting a result".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn zero_workers_rejected() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            assert!(WorkerPool::new(0).is_err());
        });
    }

    #[tokio::test]
    async fn results_come_back_per_handle() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);
        let handles: Vec<_> = (0..10).map(|i| pool.submit(move || i * 2).unwrap()).collect();
        let mut results = Vec::new();
        for h in handles {
            results.push(h.join().await.unwrap());
        }
        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded_by_pool_size() {
        let pool = WorkerPool::new(2).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                pool.submit(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();
        for h in handles {
            h.join().await.unwrap();
        }
        pool.shutdown().await;

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak concurrency {peak} exceeded pool size");
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn panicking_job_reports_internal_and_pool_survives() {
        let pool = WorkerPool::new(1).unwrap();
        let bad = pool.submit(|| -> u32 { panic!("boom") }).unwrap();
        let good = pool.submit(|| 7u32).unwrap();
        assert!(matches!(bad.join().await, Err(BatchError::Internal(_))));
        assert_eq!(good.join().await.unwrap(), 7);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_drains_queued_jobs() {
        let pool = WorkerPool::new(1).unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let done = Arc::clone(&done);
            // Handles dropped on purpose: the jobs must still run.
            let _ = pool.submit(move || {
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 5);
    }
}
