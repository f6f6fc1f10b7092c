use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use occupancy_api::app;
use occupancy_api::config::Config;
use occupancy_api::jobs::{
    AggregationJob, CleanupJob, ExpireAlertsJob, JobScheduler, PoolMetricsJob,
};
use occupancy_api::middleware::{init_metrics, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!("Starting Occupancy API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics recorder
    init_metrics()?;

    // Create database pool
    let pool = persistence::db::create_pool(&config.database_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // High-water mark of the last aggregated window end; cleanup never
    // deletes events above it. Zero means "not recovered yet": the first
    // aggregation tick re-derives it from the stored bins.
    let aggregated_through = Arc::new(AtomicI64::new(0));

    let mut scheduler = JobScheduler::new();
    scheduler.register(AggregationJob::new(
        pool.clone(),
        &config.aggregation,
        Arc::clone(&aggregated_through),
    ));
    scheduler.register(ExpireAlertsJob::new(pool.clone()));
    scheduler.register(CleanupJob::new(
        pool.clone(),
        &config.aggregation,
        &config.alerts,
        Arc::clone(&aggregated_through),
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let addr = config.socket_addr()?;
    let state = app::build_state(config, pool);
    let router = app::create_app(state);

    // Start server
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain background jobs before exiting
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
