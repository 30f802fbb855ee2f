use failgroup::{boxed, Job, Pool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- First Failure Cancels Example ---");

  let pool = Pool::named(2, "failure_pool");
  let executed = Arc::new(AtomicUsize::new(0));

  let num_jobs = 8;
  let failing_id = 2;
  let jobs: Vec<Job<String>> = (0..num_jobs)
    .map(|id| {
      let executed = executed.clone();
      boxed(async move {
        executed.fetch_add(1, Ordering::SeqCst);
        info!("Job {} starting.", id);
        tokio::time::sleep(Duration::from_millis(100)).await;
        if id == failing_id {
          info!("Job {} failing.", id);
          return Err(format!("job {} hit a simulated failure", id));
        }
        info!("Job {} finished.", id);
        Ok(())
      })
    })
    .collect();

  info!(
    "Running {} jobs on 2 workers; job {} will fail and cancel the rest of the feed.",
    num_jobs, failing_id
  );
  match pool.run(jobs).await {
    Ok(()) => info!("Unexpected: all jobs completed."),
    Err(err) => info!("Run returned first failure: {}", err),
  }

  info!(
    "{} of {} jobs actually executed; the rest were skipped at the pull boundary.",
    executed.load(Ordering::SeqCst),
    num_jobs
  );
}
