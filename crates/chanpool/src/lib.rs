//! A bounded, reusable worker pool for Tokio.
//!
//! `chanpool` runs a fixed number of asynchronous workers that process an
//! arbitrary stream of submitted jobs with one shared callback. Idle workers
//! check the sending half of their private job channel into a shared
//! registry, and a dispatcher hands each queued job to whichever worker
//! checks in next. This channel-of-channels scheme is self-balancing: the
//! dispatcher never tracks which workers are busy, it simply draws the next
//! available handle, so dispatch is O(1) and concurrency is capped by
//! construction at the worker count.
//!
//! ## Responsibilities
//!
//! - Bound concurrency to a fixed worker count chosen at construction.
//! - Apply back-pressure to submitters through a bounded job queue.
//! - Track outstanding jobs so callers can await quiescence with
//!   [`Pool::wait`].
//! - Report callback errors (and recovered panics) to an optional sink,
//!   best effort.
//! - Tear the pool down on [`Pool::quit`] by stopping the dispatcher and
//!   closing every idle worker's channel.
//!
//! ## Example
//!
//! ```
//! use chanpool::PoolBuilder;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let processed = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&processed);
//!
//! let pool = PoolBuilder::new(4).build(move |n: usize| {
//!     counter.fetch_add(n, Ordering::Relaxed);
//!     Ok(())
//! });
//! pool.start().unwrap();
//!
//! for n in 1..=10 {
//!     pool.add(n).await;
//! }
//! pool.wait().await;
//! assert_eq!(processed.load(Ordering::Relaxed), 55);
//!
//! pool.quit();
//! # }
//! ```

mod completion;
mod error;
mod pool;
mod sink;

pub use crate::error::*;
pub use crate::pool::*;
