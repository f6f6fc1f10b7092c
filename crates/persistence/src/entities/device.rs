//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl DeviceEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::Device {
        domain::models::Device {
            device_id: self.device_id,
            site_id: self.site_id,
            category: self.category,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
