//! Retention cleanup job for transition events, aggregate bins, and
//! terminal alert subscriptions.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use super::scheduler::{Job, JobFrequency};
use crate::config::{AggregationConfig, AlertConfig};
use persistence::repositories::{
    AggregateBinRepository, AlertSubscriptionRepository, TransitionEventRepository,
};

/// Events deleted per batch, bounding lock time on the event log.
const DELETE_BATCH_SIZE: i64 = 10_000;

/// Hourly retention sweep. Transition events are only deleted below the
/// aggregated-through watermark, so a stalled aggregation job never loses
/// events it has not consumed yet.
pub struct CleanupJob {
    events: TransitionEventRepository,
    bins: AggregateBinRepository,
    alerts: AlertSubscriptionRepository,
    event_retention_ms: i64,
    bin_retention_ms: i64,
    terminal_retention_days: i64,
    aggregated_through: Arc<AtomicI64>,
}

impl CleanupJob {
    pub fn new(
        pool: PgPool,
        aggregation: &AggregationConfig,
        alerts: &AlertConfig,
        aggregated_through: Arc<AtomicI64>,
    ) -> Self {
        Self {
            events: TransitionEventRepository::new(pool.clone()),
            bins: AggregateBinRepository::new(pool.clone()),
            alerts: AlertSubscriptionRepository::new(pool),
            event_retention_ms: i64::from(aggregation.event_retention_hours) * 3_600_000,
            bin_retention_ms: i64::from(aggregation.bin_retention_days) * 86_400_000,
            terminal_retention_days: i64::from(alerts.terminal_retention_days),
            aggregated_through,
        }
    }
}

#[async_trait::async_trait]
impl Job for CleanupJob {
    fn name(&self) -> &'static str {
        "cleanup_events"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let now_ms = Utc::now().timestamp_millis();

        let watermark = self.aggregated_through.load(Ordering::SeqCst);
        let events_deleted = if watermark > 0 {
            let cutoff = (now_ms - self.event_retention_ms).min(watermark);
            self.events
                .delete_before(cutoff, DELETE_BATCH_SIZE)
                .await
                .map_err(|e| format!("Failed to delete transition events: {}", e))?
        } else {
            debug!("No aggregated window yet, skipping event cleanup");
            0
        };

        let bins_deleted = self
            .bins
            .delete_before(now_ms - self.bin_retention_ms)
            .await
            .map_err(|e| format!("Failed to delete aggregate bins: {}", e))?;

        let alerts_deleted = self
            .alerts
            .delete_terminal_before(Utc::now() - Duration::days(self.terminal_retention_days))
            .await
            .map_err(|e| format!("Failed to delete terminal alerts: {}", e))?;

        info!(
            events_deleted,
            bins_deleted, alerts_deleted, "Retention cleanup completed"
        );
        Ok(())
    }
}
