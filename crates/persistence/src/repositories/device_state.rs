//! Current-state store repository implementation.
//!
//! Every write here is a per-device conditional update fenced on
//! `last_update`: a write carrying an older event timestamp than the stored
//! row is a no-op. Last-writer-wins is not sufficient for this table; two
//! near-simultaneous updates for the same device must not corrupt
//! `last_change` or `status`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeviceStateEntity;
use crate::metrics::QueryTimer;
use domain::models::device::EquipmentStatus;

/// Input for a fenced transition write.
#[derive(Debug, Clone)]
pub struct TransitionInput {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub from_status: EquipmentStatus,
    pub to_status: EquipmentStatus,
    pub timestamp: i64,
}

/// Repository for the current-state store.
#[derive(Clone)]
pub struct DeviceStateRepository {
    pool: PgPool,
}

impl DeviceStateRepository {
    /// Creates a new device state repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds the state record for a device.
    pub async fn find_by_device_id(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceStateEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceStateEntity>(
            r#"
            SELECT * FROM device_states
            WHERE device_id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lists state records for a site, optionally filtered by category.
    pub async fn list_by_site(
        &self,
        site_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<DeviceStateEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceStateEntity>(
            r#"
            SELECT * FROM device_states
            WHERE site_id = $1
              AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY category, device_id
            "#,
        )
        .bind(site_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await
    }

    /// Snapshot of every state record; input to window aggregation.
    pub async fn snapshot_all(&self) -> Result<Vec<DeviceStateEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceStateEntity>(
            r#"
            SELECT * FROM device_states
            ORDER BY site_id, category, device_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Applies a heartbeat: advances `last_update` only, fenced on the
    /// stored timestamp. Inserts the row for a device reporting for the
    /// first time (its `last_change` starts at the event timestamp).
    ///
    /// Returns `true` if the write was applied, `false` if it lost the
    /// fence to a newer concurrent write.
    pub async fn apply_heartbeat(
        &self,
        device_id: Uuid,
        site_id: &str,
        category: &str,
        status: EquipmentStatus,
        timestamp: i64,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("apply_heartbeat");
        let result = sqlx::query(
            r#"
            INSERT INTO device_states
                (device_id, site_id, category, status, last_update, last_change, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5, NOW())
            ON CONFLICT (device_id) DO UPDATE
            SET last_update = EXCLUDED.last_update,
                updated_at = NOW()
            WHERE device_states.last_update <= EXCLUDED.last_update
            "#,
        )
        .bind(device_id)
        .bind(site_id)
        .bind(category)
        .bind(status.as_str())
        .bind(timestamp)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Applies a genuine transition: the fenced state write and the event
    /// append commit in one transaction, so downstream consumers acting on
    /// the emitted notification never observe state older than the event.
    ///
    /// The event insert is keyed on `(device_id, timestamp)` and ignores
    /// conflicts, so redelivered messages do not duplicate log entries.
    ///
    /// Returns `true` if the fenced write won; `false` means a newer write
    /// for the device landed first and the caller should treat the input
    /// as stale.
    pub async fn apply_transition(&self, input: &TransitionInput) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("apply_transition");
        let mut tx = self.pool.begin().await?;

        let state_write = sqlx::query(
            r#"
            INSERT INTO device_states
                (device_id, site_id, category, status, last_update, last_change, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5, NOW())
            ON CONFLICT (device_id) DO UPDATE
            SET status = EXCLUDED.status,
                site_id = EXCLUDED.site_id,
                category = EXCLUDED.category,
                last_update = EXCLUDED.last_update,
                last_change = EXCLUDED.last_change,
                updated_at = NOW()
            WHERE device_states.last_update <= EXCLUDED.last_update
            "#,
        )
        .bind(input.device_id)
        .bind(&input.site_id)
        .bind(&input.category)
        .bind(input.to_status.as_str())
        .bind(input.timestamp)
        .execute(&mut *tx)
        .await?;

        if state_write.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO transition_events
                (device_id, site_id, category, from_status, to_status, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (device_id, timestamp) DO NOTHING
            "#,
        )
        .bind(input.device_id)
        .bind(&input.site_id)
        .bind(&input.category)
        .bind(input.from_status.as_str())
        .bind(input.to_status.as_str())
        .bind(input.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(true)
    }
}
