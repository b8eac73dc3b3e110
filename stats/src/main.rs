//! Batch entry point for the scheduled aggregation run.
//!
//! Invoked by cron with no arguments. Exits non-zero only when the
//! process-level setup (config, store connection) fails; individual phase
//! failures are logged by the aggregator and do not fail the run.

use dotenv::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

use stats::{App, aggregator, config::Config};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::new_from_env();
    let app = match App::initialize(config) {
        Ok(app) => app,
        Err(err) => {
            tracing::error!(?err, "failed to initialize the application");
            std::process::exit(1);
        }
    };

    let now = chrono::Utc::now().naive_utc();
    match aggregator::run(&app, now).await {
        Ok(report) if report.skipped => {
            tracing::warn!("nothing recomputed, another run was in progress");
        }
        Ok(report) => {
            tracing::info!(
                articles = report.articles,
                failed_phases = report.failed_phases,
                purged_rows = report.purged_rows,
                "aggregation run finished"
            );
        }
        Err(err) => {
            tracing::error!(?err, "aggregation run failed");
            std::process::exit(1);
        }
    }
}
