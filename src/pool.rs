use crate::job::Job;
use crate::outcome::{Capture, FirstFailure};

use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use futures::FutureExt;
use kanal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, trace, Instrument};

lazy_static::lazy_static! {
  static ref NEXT_RUN_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
}

/// A reusable pool of worker slots for running batches of fallible jobs.
///
/// The worker count is fixed at construction. A pool holds no run state:
/// every call to [`Pool::run`] gets a fresh feed, a fresh cancellation scope
/// and a fresh first-failure latch, so independent runs on one pool cannot
/// leak errors or cancellation into each other.
#[derive(Clone)]
pub struct Pool {
  pool_name: Arc<String>,
  worker_count: usize,
}

impl Pool {
  /// Creates a pool with the given worker count.
  ///
  /// The count is taken as-is: no cap, no default substitution. A count of
  /// zero is legal but degenerate; a run on such a pool returns immediately
  /// without executing any job.
  pub fn new(worker_count: usize) -> Self {
    Self::named(worker_count, "pool")
  }

  /// Creates a pool with a name that is attached to its tracing spans.
  pub fn named(worker_count: usize, name: &str) -> Self {
    Self {
      pool_name: Arc::new(name.to_string()),
      worker_count,
    }
  }

  pub fn name(&self) -> &str {
    &self.pool_name
  }

  pub fn worker_count(&self) -> usize {
    self.worker_count
  }

  /// Runs a batch of jobs to completion or first failure.
  ///
  /// Spawns exactly `worker_count` workers, feeds them the jobs in
  /// submission order and waits for every worker to exit before returning.
  /// On full success this returns `Ok(())`. If any job fails, the error of
  /// the first failure (by completion order) is returned and remaining
  /// queued jobs are skipped; jobs already pulled by another worker still
  /// run to completion, so up to `worker_count - 1` jobs may execute after
  /// the failing one.
  ///
  /// A panicking job counts as that worker's failure; the payload is
  /// re-raised in the caller via [`resume_unwind`] once all workers have
  /// exited.
  pub async fn run<E: Send + 'static>(&self, jobs: Vec<Job<E>>) -> Result<(), E> {
    self.run_with_token(&CancellationToken::new(), jobs).await
  }

  /// Cancellation-aware variant of [`Pool::run`].
  ///
  /// The run observes a child of `parent`: if `parent` is already cancelled,
  /// or is cancelled by the caller mid-run, workers stop pulling new jobs
  /// exactly as they do after an internally detected failure, and in-flight
  /// jobs finish. Externally cancelled runs that saw no job failure return
  /// `Ok(())`. The run never cancels `parent` itself.
  pub async fn run_with_token<E: Send + 'static>(
    &self,
    parent: &CancellationToken,
    jobs: Vec<Job<E>>,
  ) -> Result<(), E> {
    let run_id = NEXT_RUN_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    let token = parent.child_token();
    let failure = Arc::new(FirstFailure::<E>::new(token.clone()));

    let batch_len = jobs.len();
    debug!(
      pool_name = %*self.pool_name,
      %run_id,
      batch_len,
      workers = self.worker_count,
      "Starting run."
    );

    // Feed sized to the batch: enqueueing never blocks, and dropping the
    // sender afterwards lets idle workers observe end-of-feed instead of
    // blocking forever.
    let (feed_tx, feed_rx) = kanal::bounded_async::<Job<E>>(batch_len.max(1));
    for job in jobs {
      if feed_tx.send(job).await.is_err() {
        break;
      }
    }
    drop(feed_tx);

    let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(self.worker_count);
    for worker_index in 0..self.worker_count {
      let span = info_span!(
        "pool_worker",
        pool_name = %*self.pool_name,
        %run_id,
        worker_index
      );
      workers.push(tokio::spawn(
        worker_loop(feed_rx.clone(), failure.clone(), token.clone()).instrument(span),
      ));
    }
    drop(feed_rx);

    // Join barrier: the latch is read only after every worker has exited, so
    // no outcome is in flight when the caller observes the result.
    for handle in workers {
      if let Err(join_error) = handle.await {
        error!(
          pool_name = %*self.pool_name,
          %run_id,
          "Worker task failed to join: {:?}",
          join_error
        );
      }
    }

    debug!(pool_name = %*self.pool_name, %run_id, "Run finished. All workers exited.");

    match failure.take() {
      Capture::None => Ok(()),
      Capture::Error(err) => Err(err),
      Capture::Panicked(payload) => resume_unwind(payload),
    }
  }
}

/// One worker: pull a job, execute it, repeat.
///
/// Cancellation is advisory and checked only at the pull boundary, never
/// mid-job. A worker whose own job fails (or panics) offers the failure to
/// the latch and exits without pulling further jobs; the latch's cancellation
/// signal stops the other workers at their next pull.
async fn worker_loop<E: Send + 'static>(
  feed: kanal::AsyncReceiver<Job<E>>,
  failure: Arc<FirstFailure<E>>,
  token: CancellationToken,
) {
  loop {
    let job = tokio::select! {
      biased;

      _ = token.cancelled() => {
        trace!("Cancellation observed at pull boundary. Worker exiting.");
        break;
      }

      recv_result = feed.recv() => match recv_result {
        Ok(job) => job,
        Err(_) => {
          trace!("Feed closed and drained. Worker exiting.");
          break;
        }
      },
    };

    match AssertUnwindSafe(job).catch_unwind().await {
      Ok(Ok(())) => {
        trace!("Job completed.");
      }
      Ok(Err(err)) => {
        debug!("Job failed. Worker self-aborting.");
        failure.offer_error(err);
        break;
      }
      Err(payload) => {
        error!("Job panicked. Worker self-aborting.");
        failure.offer_panic(payload);
        break;
      }
    }
  }
}
