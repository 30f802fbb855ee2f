use std::any::Any;
use std::mem;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// What a finished run observed, read back out of the latch after the join
/// barrier.
pub(crate) enum Capture<E> {
  /// No job failed.
  None,
  /// The first job failure of the run.
  Error(E),
  /// The first job of the run panicked; the payload is re-raised in the
  /// caller once every worker has exited.
  Panicked(Box<dyn Any + Send + 'static>),
}

/// Write-once latch guarding a run's single failure slot.
///
/// The first worker to offer a failure wins and triggers the run's
/// cancellation token; every later offer is a no-op and its value is
/// discarded. The slot is only read after all workers have exited, so a late
/// offer can never race the read.
pub(crate) struct FirstFailure<E> {
  slot: Mutex<Capture<E>>,
  token: CancellationToken,
}

impl<E> FirstFailure<E> {
  pub(crate) fn new(token: CancellationToken) -> Self {
    Self {
      slot: Mutex::new(Capture::None),
      token,
    }
  }

  /// Offers a job error to the latch. Returns whether it was captured.
  pub(crate) fn offer_error(&self, err: E) -> bool {
    self.capture(Capture::Error(err))
  }

  /// Offers a job panic payload to the latch. Returns whether it was captured.
  pub(crate) fn offer_panic(&self, payload: Box<dyn Any + Send + 'static>) -> bool {
    self.capture(Capture::Panicked(payload))
  }

  fn capture(&self, failure: Capture<E>) -> bool {
    let mut slot = self.slot.lock();
    match *slot {
      Capture::None => {
        *slot = failure;
        // Cancel while still holding the lock so the token fires exactly
        // once, coincident with the winning write.
        self.token.cancel();
        trace!("First failure captured. Run cancellation signalled.");
        true
      }
      _ => {
        trace!("Failure observed after first capture. Discarding.");
        false
      }
    }
  }

  /// Takes the captured failure, leaving the slot empty.
  pub(crate) fn take(&self) -> Capture<E> {
    mem::replace(&mut *self.slot.lock(), Capture::None)
  }
}
