//! The dispatch loop matching queued jobs to idle workers.

use crate::completion::CompletionTracker;
use crate::pool::registry::IdleRegistry;
use crate::pool::worker::Delivery;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Single control loop pulling jobs off the bounded queue.
///
/// Each job is handed to a worker by an ephemeral spawned task, so waiting
/// for an idle worker for job *k* never stops the dispatcher from pulling
/// job *k + 1* off the queue; in-flight hand-offs are bounded by the queue
/// capacity, which equals the worker count.
///
/// The loop exits as soon as the shutdown token fires, regardless of jobs
/// still sitting in the queue, or when the pool handle is dropped and the
/// queue is exhausted.
pub(crate) async fn dispatch_loop<J>(
    mut jobs: mpsc::Receiver<J>,
    registry: Arc<IdleRegistry<J>>,
    completions: Arc<CompletionTracker>,
    shutdown: CancellationToken,
) where
    J: Send + 'static,
{
    loop {
        tokio::select! {
            // Shutdown wins over pending jobs.
            biased;
            () = shutdown.cancelled() => break,
            next = jobs.recv() => match next {
                Some(job) => {
                    let registry = Arc::clone(&registry);
                    let completions = Arc::clone(&completions);
                    tokio::spawn(hand_off(job, registry, completions));
                }
                None => break,
            },
        }
    }

    // Jobs still queued when the loop exits are never dispatched. Settle
    // their completion entries so a late `wait` still converges. `recv` is
    // required here rather than `try_recv`: a submitter that acquired its
    // send permit before `close` may still push its job afterwards, and
    // only `recv` waits those permits out before reporting the queue empty.
    jobs.close();
    let mut _discarded = 0_usize;
    while jobs.recv().await.is_some() {
        completions.finish_one();
        _discarded += 1;
    }
    #[cfg(feature = "tracing")]
    if _discarded > 0 {
        tracing::warn!("discarded {_discarded} undispatched jobs at shutdown");
    }
}

/// Delivers one job to the next worker that becomes idle.
async fn hand_off<J>(
    job: J,
    registry: Arc<IdleRegistry<J>>,
    completions: Arc<CompletionTracker>,
) where
    J: Send + 'static,
{
    match registry.check_out().await {
        Some(handle) => {
            let delivery = Delivery {
                job,
                handle: handle.clone(),
            };
            if handle.send(delivery).await.is_err() {
                // The worker terminated between check-out and delivery;
                // settle the job's completion entry so `wait` converges.
                completions.finish_one();
                #[cfg(feature = "tracing")]
                tracing::warn!("worker exited before delivery, job discarded");
            }
        }
        None => {
            // Shutdown drained the registry before a worker became idle.
            completions.finish_one();
            #[cfg(feature = "tracing")]
            tracing::warn!("registry closed before delivery, job discarded");
        }
    }
}
