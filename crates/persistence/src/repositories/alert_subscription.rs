//! Alert subscription repository implementation.
//!
//! The `active -> fired` transition is a compare-and-set on the status
//! column: when two transitions for the same device race, exactly one
//! caller observes the row flip and sends the notification.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::AlertSubscriptionEntity;

/// Repository for alert subscription database operations.
#[derive(Clone)]
pub struct AlertSubscriptionRepository {
    pool: PgPool,
}

impl AlertSubscriptionRepository {
    /// Creates a new alert subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new active subscription.
    pub async fn create(
        &self,
        user_id: Uuid,
        device_id: Uuid,
        quiet_start_minute: Option<i32>,
        quiet_end_minute: Option<i32>,
        expires_at: DateTime<Utc>,
    ) -> Result<AlertSubscriptionEntity, sqlx::Error> {
        sqlx::query_as::<_, AlertSubscriptionEntity>(
            r#"
            INSERT INTO alert_subscriptions
                (user_id, device_id, status, quiet_start_minute, quiet_end_minute, expires_at)
            VALUES ($1, $2, 'active', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(quiet_start_minute)
        .bind(quiet_end_minute)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Finds a subscription by its alert_id.
    pub async fn find_by_alert_id(
        &self,
        alert_id: Uuid,
    ) -> Result<Option<AlertSubscriptionEntity>, sqlx::Error> {
        sqlx::query_as::<_, AlertSubscriptionEntity>(
            r#"
            SELECT * FROM alert_subscriptions
            WHERE alert_id = $1
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lists subscriptions for a user, newest first.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        include_terminal: bool,
    ) -> Result<Vec<AlertSubscriptionEntity>, sqlx::Error> {
        sqlx::query_as::<_, AlertSubscriptionEntity>(
            r#"
            SELECT * FROM alert_subscriptions
            WHERE user_id = $1
              AND ($2 OR status = 'active')
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(include_terminal)
        .fetch_all(&self.pool)
        .await
    }

    /// Active subscriptions watching a device.
    pub async fn find_active_by_device(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<AlertSubscriptionEntity>, sqlx::Error> {
        sqlx::query_as::<_, AlertSubscriptionEntity>(
            r#"
            SELECT * FROM alert_subscriptions
            WHERE device_id = $1 AND status = 'active'
            ORDER BY created_at ASC
            "#,
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Compare-and-set `active -> fired`. Returns the updated row for the
    /// single winner; `None` means the subscription was already terminal
    /// or past its deadline. The `expires_at` guard makes expiry
    /// authoritative here even before the expiry sweep has run.
    pub async fn fire(
        &self,
        alert_id: Uuid,
    ) -> Result<Option<AlertSubscriptionEntity>, sqlx::Error> {
        sqlx::query_as::<_, AlertSubscriptionEntity>(
            r#"
            UPDATE alert_subscriptions
            SET status = 'fired',
                fired_at = NOW()
            WHERE alert_id = $1 AND status = 'active' AND expires_at > NOW()
            RETURNING *
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Compare-and-set `active -> cancelled`. Returns the updated row, or
    /// `None` if the subscription was not active.
    pub async fn cancel(
        &self,
        alert_id: Uuid,
    ) -> Result<Option<AlertSubscriptionEntity>, sqlx::Error> {
        sqlx::query_as::<_, AlertSubscriptionEntity>(
            r#"
            UPDATE alert_subscriptions
            SET status = 'cancelled'
            WHERE alert_id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Marks every active subscription past its deadline as expired.
    /// Returns the number of rows transitioned.
    pub async fn expire_due(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE alert_subscriptions
            SET status = 'expired'
            WHERE status = 'active' AND expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Deletes terminal subscriptions older than the retention cutoff.
    pub async fn delete_terminal_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM alert_subscriptions
            WHERE status IN ('fired', 'cancelled', 'expired')
              AND created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
