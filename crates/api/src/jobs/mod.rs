//! Background job scheduler and job implementations.

mod aggregation;
mod cleanup;
mod expire_alerts;
mod pool_metrics;
mod scheduler;

pub use aggregation::AggregationJob;
pub use cleanup::CleanupJob;
pub use expire_alerts::ExpireAlertsJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::JobScheduler;
