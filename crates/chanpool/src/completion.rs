//! Completion tracking for submitted jobs.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counts submitted-but-unfinished jobs and lets callers await quiescence.
///
/// The count is incremented *before* a job is enqueued and decremented once
/// its callback has run, so a waiter can never observe zero while an
/// admitted job is still unprocessed. Only [`CompletionTracker::wait_idle`]
/// is reachable from pool callers; the raw count never escapes this module.
pub(crate) struct CompletionTracker {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl CompletionTracker {
    pub(crate) fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    /// Records one admitted job. Must be called before the job is enqueued.
    pub(crate) fn start_one(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Records one finished job, waking waiters when the count hits zero.
    pub(crate) fn finish_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Resolves once every recorded job has finished, immediately if nothing
    /// is outstanding.
    pub(crate) async fn wait_idle(&self) {
        loop {
            // Register interest before checking the count so a final
            // `finish_one` between the check and the await cannot be lost.
            let notified = self.idle.notified();
            if self.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}
