//! The worker loop and the job execution boundary.

use crate::completion::CompletionTracker;
use crate::error::JobError;
use crate::pool::registry::IdleRegistry;
use crate::sink::ErrorSink;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A job en route to a worker.
///
/// The delivery carries the sending half of the worker's own channel, so
/// that after processing the job the worker can check itself back into the
/// registry. At rest exactly one copy of the handle exists, held either by
/// the registry (worker idle) or by the worker itself (worker busy), which
/// is what makes registry drainage close idle workers' channels.
pub(crate) struct Delivery<J> {
    pub(crate) job: J,
    pub(crate) handle: WorkerHandle<J>,
}

/// Handle to an idle worker: the sending half of its private job channel.
pub(crate) type WorkerHandle<J> = mpsc::Sender<Delivery<J>>;

/// Worker task: check in as idle, wait for one delivery, run the callback,
/// repeat.
///
/// The loop terminates on either of two signals:
///
/// - the private channel closes while the worker is idle (shutdown drained
///   the registry and dropped the only sender), or
/// - a check-in fails because the registry was closed while the worker was
///   busy processing its last job.
///
/// Designed to be spawned as a Tokio task; one task per worker.
pub(crate) async fn worker_loop<J, F>(
    _worker_id: usize,
    handle: WorkerHandle<J>,
    mut deliveries: mpsc::Receiver<Delivery<J>>,
    registry: Arc<IdleRegistry<J>>,
    callback: Arc<F>,
    completions: Arc<CompletionTracker>,
    sink: Option<Arc<ErrorSink>>,
) where
    J: Send + 'static,
    F: Fn(J) -> Result<(), JobError> + Send + Sync + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("worker {_worker_id} started");

    if registry.check_in(handle).await.is_err() {
        // The pool was shut down before this worker ever went idle.
        #[cfg(feature = "tracing")]
        tracing::trace!("worker {_worker_id} stopped before first check-in");
        return;
    }

    while let Some(Delivery { job, handle }) = deliveries.recv().await {
        run_job(callback.as_ref(), job, sink.as_deref());
        completions.finish_one();

        if registry.check_in(handle).await.is_err() {
            // Shutdown closed the registry while this worker was busy.
            break;
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("worker {_worker_id} stopped");
}

/// Runs one job inside a panic-recovery boundary.
///
/// A callback that panics is reported through the same path as one that
/// returns an error, so a single bad job cannot take the worker out of
/// service.
fn run_job<J, F>(callback: &F, job: J, sink: Option<&ErrorSink>)
where
    F: Fn(J) -> Result<(), JobError>,
{
    let failure = match panic::catch_unwind(AssertUnwindSafe(|| callback(job))) {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(payload) => Some(panic_description(payload.as_ref())),
    };

    if let Some(_description) = &failure {
        #[cfg(feature = "tracing")]
        tracing::warn!("job failed: {_description}");
    }
    if let (Some(description), Some(sink)) = (failure, sink) {
        sink.report(&description);
    }
}

fn panic_description(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("job panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("job panicked: {message}")
    } else {
        "job panicked".to_string()
    }
}
