use std::future::Future;
use std::pin::Pin;

/// The unit of work the pool executes.
///
/// A job is a niladic future that either completes with `Ok(())` or fails
/// with an error of type `E`. The pool treats `E` as opaque: the first
/// captured error is handed back to the caller unchanged. Jobs carry no
/// identity beyond their position in the submitted batch.
pub type Job<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send + 'static>>;

/// Boxes a plain future into a [`Job`].
pub fn boxed<F, E>(future: F) -> Job<E>
where
  F: Future<Output = Result<(), E>> + Send + 'static,
{
  Box::pin(future)
}
