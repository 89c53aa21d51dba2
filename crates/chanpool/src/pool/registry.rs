//! The idle-worker registry: a self-service free list of worker handles.

use crate::pool::worker::WorkerHandle;
use tokio::sync::{Mutex, mpsc};

/// Marker error: a worker tried to check in after shutdown closed the
/// registry. The worker treats it as its signal to terminate.
#[derive(Debug)]
pub(crate) struct RegistryClosed;

/// Bounded collection of currently-idle workers' channel handles.
///
/// Workers check their handle in when ready for a job; hand-off tasks check
/// one out to deliver a job, waiting if every worker is busy. Capacity
/// equals the worker count, so the registry can never hold more handles
/// than there are workers and dispatch concurrency is bounded by
/// construction.
///
/// The receiving half sits behind an async mutex because hand-off tasks run
/// concurrently and each must draw exactly one handle.
pub(crate) struct IdleRegistry<J> {
    check_in_tx: mpsc::Sender<WorkerHandle<J>>,
    check_out_rx: Mutex<mpsc::Receiver<WorkerHandle<J>>>,
}

impl<J> IdleRegistry<J> {
    pub(crate) fn new(capacity: usize) -> Self {
        let (check_in_tx, check_out_rx) = mpsc::channel(capacity);
        Self {
            check_in_tx,
            check_out_rx: Mutex::new(check_out_rx),
        }
    }

    /// Announces a worker as idle by publishing its handle.
    ///
    /// # Errors
    ///
    /// Fails once [`IdleRegistry::drain`] has closed the registry.
    pub(crate) async fn check_in(&self, handle: WorkerHandle<J>) -> Result<(), RegistryClosed> {
        self.check_in_tx
            .send(handle)
            .await
            .map_err(|_| RegistryClosed)
    }

    /// Takes the next idle worker, waiting for one to check in if none is
    /// currently available. Returns `None` once the registry is closed and
    /// empty.
    pub(crate) async fn check_out(&self) -> Option<WorkerHandle<J>> {
        self.check_out_rx.lock().await.recv().await
    }

    /// Closes the registry and discards every immediately-available handle.
    ///
    /// Dropping a drained handle removes the last sender of an idle
    /// worker's private channel, which terminates that worker. Workers that
    /// are mid-job at this point observe the closed registry on their next
    /// check-in instead.
    pub(crate) async fn drain(&self) {
        let mut check_out_rx = self.check_out_rx.lock().await;
        check_out_rx.close();
        while check_out_rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::worker::Delivery;
    use core::time::Duration;
    use std::sync::Arc;
    use tokio::time::timeout;

    fn handle() -> (WorkerHandle<u32>, mpsc::Receiver<Delivery<u32>>) {
        mpsc::channel(1)
    }

    #[tokio::test]
    async fn check_out_returns_checked_in_handles() {
        let registry = IdleRegistry::new(2);
        let (tx, _rx) = handle();
        registry.check_in(tx).await.unwrap();
        assert!(registry.check_out().await.is_some());
    }

    #[tokio::test]
    async fn check_out_waits_for_an_idle_worker() {
        let registry = Arc::new(IdleRegistry::new(1));

        let pending = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.check_out().await })
        };

        let (tx, _rx) = handle();
        registry.check_in(tx).await.unwrap();
        let checked_out = timeout(Duration::from_millis(200), pending)
            .await
            .expect("check_out should resolve once a worker checks in")
            .unwrap();
        assert!(checked_out.is_some());
    }

    #[tokio::test]
    async fn drain_closes_the_registry_and_drops_idle_handles() {
        let registry = IdleRegistry::new(2);
        let (tx, mut rx) = handle();
        registry.check_in(tx).await.unwrap();

        registry.drain().await;

        // The idle handle was dropped: the worker-side channel is closed.
        assert!(rx.recv().await.is_none());
        // Late check-ins fail, and check-outs observe closure.
        let (tx, _rx) = handle();
        assert!(registry.check_in(tx).await.is_err());
        assert!(registry.check_out().await.is_none());
    }
}
