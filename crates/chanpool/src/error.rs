//! Error types for the worker pool.
//!
//! The pool itself can fail in exactly one way (starting it twice); job
//! callbacks report their own failures as boxed errors, which the pool
//! forwards to the configured sink without ever surfacing them to the
//! submitter.

pub type Result<T> = core::result::Result<T, Error>;

/// Error reported by a job callback.
///
/// The pool never inspects the value beyond formatting its description for
/// the error sink, so any error type can be boxed into it with `?` or
/// [`Into::into`].
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for pool operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// [`Pool::start`](crate::Pool::start) was called on a pool whose
    /// workers and dispatcher are already running.
    #[error("pool already started")]
    AlreadyStarted,
}
