//! The pool itself: builder and handle, idle-worker registry, dispatcher,
//! and the worker loop.

mod dispatch;
mod manager;
mod registry;
mod worker;

pub use crate::pool::manager::*;
