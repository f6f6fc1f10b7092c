//! Alert expiry job.

use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use persistence::repositories::AlertSubscriptionRepository;

/// Moves active subscriptions past their TTL to the expired state. Runs
/// every minute so an expired subscription can never fire much later than
/// its deadline.
pub struct ExpireAlertsJob {
    alerts: AlertSubscriptionRepository,
}

impl ExpireAlertsJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            alerts: AlertSubscriptionRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireAlertsJob {
    fn name(&self) -> &'static str {
        "expire_alerts"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let expired = self
            .alerts
            .expire_due()
            .await
            .map_err(|e| format!("Failed to expire alerts: {}", e))?;

        if expired > 0 {
            info!(expired, "Expired alert subscriptions");
        }
        Ok(())
    }
}
