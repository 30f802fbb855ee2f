use failgroup::{boxed, Job, Pool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- External Cancellation Example ---");

  let pool = Pool::named(2, "cancel_pool");
  let executed = Arc::new(AtomicUsize::new(0));
  let caller_token = CancellationToken::new();

  let num_jobs = 10;
  let jobs: Vec<Job<String>> = (0..num_jobs)
    .map(|id| {
      let executed = executed.clone();
      boxed(async move {
        executed.fetch_add(1, Ordering::SeqCst);
        info!("Job {} starting (100ms).", id);
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("Job {} finished.", id);
        Ok(())
      })
    })
    .collect();

  let token_for_canceller = caller_token.clone();
  tokio::spawn(async move {
    info!("Caller will cancel the run in 250ms.");
    tokio::time::sleep(Duration::from_millis(250)).await;
    info!("Caller cancelling.");
    token_for_canceller.cancel();
  });

  // External cancellation behaves like an internal failure: dispatch stops at
  // the pull boundary and in-flight jobs finish. With no failed job the run
  // still reports success.
  match pool.run_with_token(&caller_token, jobs).await {
    Ok(()) => info!("Run returned cleanly after external cancellation."),
    Err(err) => info!("Run failed: {}", err),
  }

  info!(
    "{} of {} jobs executed before the cancellation was observed.",
    executed.load(Ordering::SeqCst),
    num_jobs
  );
}
