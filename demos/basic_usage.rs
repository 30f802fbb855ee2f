use failgroup::{boxed, Job, Pool};
use std::time::Duration;
use tracing::info;

async fn my_job(id: usize, delay_ms: u64) -> Result<(), String> {
  info!("Job {} starting, will sleep for {}ms", id, delay_ms);
  tokio::time::sleep(Duration::from_millis(delay_ms)).await;
  info!("Job {} finished successfully after {}ms", id, delay_ms);
  Ok(())
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false) // Disable module paths for cleaner example output
    .init();

  info!("--- Basic Usage Example ---");

  let pool = Pool::named(2, "basic_pool");

  let jobs: Vec<Job<String>> = (0..5).map(|i| boxed(my_job(i, 200 + i as u64 * 50))).collect();

  info!("Running {} jobs on {} workers.", 5, pool.worker_count());
  match pool.run(jobs).await {
    Ok(()) => info!("All jobs completed successfully."),
    Err(err) => info!("Run failed: {}", err),
  }

  info!("--- Basic Usage Example Complete ---");
}
