//! The pool handle and its builder.
//!
//! This module defines [`Pool`], the public face of the crate. A pool is
//! constructed through [`PoolBuilder`] with a fixed worker count, one shared
//! processing callback, and an optional error sink; [`Pool::start`] spawns
//! the workers and the dispatcher, [`Pool::add`] submits jobs,
//! [`Pool::wait`] awaits quiescence, and [`Pool::quit`] tears the pool
//! down.

use crate::completion::CompletionTracker;
use crate::error::{Error, JobError, Result};
use crate::pool::dispatch::dispatch_loop;
use crate::pool::registry::IdleRegistry;
use crate::pool::worker::worker_loop;
use crate::sink::ErrorSink;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Builder for [`Pool`].
///
/// ```
/// use chanpool::PoolBuilder;
///
/// let pool = PoolBuilder::new(8)
///     .error_sink(std::io::stderr())
///     .build(|line: String| {
///         println!("{line}");
///         Ok(())
///     });
/// ```
pub struct PoolBuilder {
    workers: usize,
    sink: Option<ErrorSink>,
}

impl PoolBuilder {
    /// Starts building a pool of `workers` concurrent workers.
    ///
    /// # Panics
    ///
    /// Panics if `workers` is zero.
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "a pool requires at least one worker");
        Self {
            workers,
            sink: None,
        }
    }

    /// Sets the destination for job error descriptions, one line per
    /// failed job. Without a sink, job errors are silently discarded.
    pub fn error_sink(mut self, writer: impl Write + Send + 'static) -> Self {
        self.sink = Some(ErrorSink::new(Box::new(writer)));
        self
    }

    /// Finishes the builder with the shared processing callback.
    ///
    /// The callback runs on whichever worker receives each job; the pool
    /// returned is not yet running until [`Pool::start`] is called.
    pub fn build<J, F>(self, callback: F) -> Pool<J, F>
    where
        J: Send + 'static,
        F: Fn(J) -> core::result::Result<(), JobError> + Send + Sync + 'static,
    {
        // Queue capacity equals the worker count: this is the pool's only
        // back-pressure mechanism.
        let (jobs_tx, jobs_rx) = mpsc::channel(self.workers);

        Pool {
            worker_count: self.workers,
            callback: Arc::new(callback),
            completions: Arc::new(CompletionTracker::new()),
            registry: Arc::new(IdleRegistry::new(self.workers)),
            sink: self.sink.map(Arc::new),
            jobs_tx,
            jobs_rx: Mutex::new(Some(jobs_rx)),
            shutdown: CancellationToken::new(),
        }
    }
}

/// A bounded, reusable worker pool.
///
/// At most `worker_count` jobs execute concurrently at any instant: a job
/// is only ever delivered on a channel drawn from the idle-worker registry,
/// and the registry never holds more handles than there are workers.
///
/// Jobs are handed out in FIFO arrival order, but whichever worker becomes
/// idle first claims the next job, so completion order reflects execution
/// time, not submission order.
///
/// The intended lifecycle is [`start`](Pool::start), any number of
/// [`add`](Pool::add)/[`wait`](Pool::wait) rounds, then a final
/// [`wait`](Pool::wait) followed by [`quit`](Pool::quit).
pub struct Pool<J, F> {
    worker_count: usize,
    callback: Arc<F>,
    completions: Arc<CompletionTracker>,
    registry: Arc<IdleRegistry<J>>,
    sink: Option<Arc<ErrorSink>>,
    jobs_tx: mpsc::Sender<J>,
    jobs_rx: Mutex<Option<mpsc::Receiver<J>>>,
    shutdown: CancellationToken,
}

impl<J, F> Pool<J, F>
where
    J: Send + 'static,
    F: Fn(J) -> core::result::Result<(), JobError> + Send + Sync + 'static,
{
    /// Spawns the worker tasks and the dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] if the pool is already running.
    pub fn start(&self) -> Result<()> {
        let Some(jobs_rx) = self.jobs_rx.lock().ok().and_then(|mut rx| rx.take()) else {
            return Err(Error::AlreadyStarted);
        };

        for worker_id in 0..self.worker_count {
            let (handle, deliveries) = mpsc::channel(1);
            tokio::spawn(worker_loop(
                worker_id,
                handle,
                deliveries,
                Arc::clone(&self.registry),
                Arc::clone(&self.callback),
                Arc::clone(&self.completions),
                self.sink.clone(),
            ));
        }

        tokio::spawn(dispatch_loop(
            jobs_rx,
            Arc::clone(&self.registry),
            Arc::clone(&self.completions),
            self.shutdown.clone(),
        ));

        #[cfg(feature = "tracing")]
        tracing::debug!("pool started with {} workers", self.worker_count);

        Ok(())
    }

    /// Submits one job to the pool.
    ///
    /// The job is counted as outstanding before it is enqueued, so a
    /// concurrent [`wait`](Pool::wait) can never observe quiescence while
    /// an admitted job is still on its way to the queue. If the queue is
    /// full this call waits for space to free; that wait is the pool's only
    /// back-pressure mechanism.
    ///
    /// Submitting after [`quit`](Pool::quit) is a contract violation; such
    /// a job is discarded rather than left to hang the pool's accounting.
    pub async fn add(&self, job: J) {
        self.completions.start_one();
        if self.jobs_tx.send(job).await.is_err() {
            // The dispatcher has already exited; roll the accounting back.
            self.completions.finish_one();
            #[cfg(feature = "tracing")]
            tracing::warn!("job submitted after shutdown was discarded");
        }
    }

    /// Resolves once every submitted job has finished, immediately if
    /// nothing is outstanding.
    ///
    /// Concurrent submitters and multiple simultaneous waiters are fine;
    /// a waiter simply keeps waiting until work submitted meanwhile has
    /// also finished.
    pub async fn wait(&self) {
        self.completions.wait_idle().await;
    }

    /// Shuts the pool down without blocking the caller.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// Stops the dispatcher, then drains the idle-worker registry so every
    /// idle worker's channel is closed and the worker terminates. Workers
    /// that are mid-job finish that job first and terminate on their next
    /// check-in.
    ///
    /// Call this only after a [`wait`](Pool::wait) has returned; it is
    /// expected to be the final operation performed on the pool.
    pub fn quit(&self) {
        self.shutdown.cancel();
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            registry.drain().await;
            #[cfg(feature = "tracing")]
            tracing::debug!("idle-worker registry drained");
        });
    }
}
