//! Device reference data repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeviceEntity;

/// Repository for device reference data. Devices are created at
/// provisioning time and read-only to the ingest pipeline.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new device repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a device, updating reference data on re-registration.
    pub async fn register(
        &self,
        device_id: Uuid,
        site_id: &str,
        category: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<DeviceEntity, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(
            r#"
            INSERT INTO devices (device_id, site_id, category, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (device_id) DO UPDATE
            SET site_id = EXCLUDED.site_id,
                category = EXCLUDED.category,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude
            RETURNING *
            "#,
        )
        .bind(device_id)
        .bind(site_id)
        .bind(category)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await
    }

    /// Finds a device by its identifier.
    pub async fn find_by_device_id(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT * FROM devices
            WHERE device_id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lists devices for a site, optionally filtered by category.
    pub async fn list_by_site(
        &self,
        site_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT * FROM devices
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
}
