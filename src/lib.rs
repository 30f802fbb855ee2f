//! A Tokio-based job pool that runs a batch of fallible futures with bounded
//! concurrency, first-failure capture and cooperative cancellation.
//!
//! A [`Pool`] owns a fixed worker count. Each call to [`Pool::run`] spawns
//! that many workers, feeds them the submitted jobs in order, and blocks the
//! caller until every worker has exited. The first job failure is captured,
//! further dispatch stops, and the captured error is returned; jobs already
//! mid-execution run to completion.

mod job;
mod outcome;
mod pool;

pub use job::{boxed, Job};
pub use pool::Pool;
