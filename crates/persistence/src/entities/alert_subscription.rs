//! Alert subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::alert_subscription::{AlertStatus, AlertSubscription, QuietHours};

/// Database row mapping for the alert_subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertSubscriptionEntity {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub status: String,
    pub quiet_start_minute: Option<i32>,
    pub quiet_end_minute: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub fired_at: Option<DateTime<Utc>>,
}

impl AlertSubscriptionEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> AlertSubscription {
        let quiet_hours = match (self.quiet_start_minute, self.quiet_end_minute) {
            (Some(start_minute), Some(end_minute)) => Some(QuietHours {
                start_minute,
                end_minute,
            }),
            _ => None,
        };
        AlertSubscription {
            alert_id: self.alert_id,
            user_id: self.user_id,
            device_id: self.device_id,
            status: self
                .status
                .parse::<AlertStatus>()
                .unwrap_or(AlertStatus::Cancelled),
            quiet_hours,
            created_at: self.created_at,
            expires_at: self.expires_at,
            fired_at: self.fired_at,
        }
    }
}
