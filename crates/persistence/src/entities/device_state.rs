//! Current-state entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::device::EquipmentStatus;
use domain::models::state_record::StateRecord;

/// Database row mapping for the device_states table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceStateEntity {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub status: String,
    pub last_update: i64,
    pub last_change: i64,
    pub updated_at: DateTime<Utc>,
}

impl DeviceStateEntity {
    /// Convert to domain model. An unparseable status column is read as
    /// offline rather than failing the whole query.
    pub fn into_domain(self) -> StateRecord {
        let status = self
            .status
            .parse::<EquipmentStatus>()
            .unwrap_or(EquipmentStatus::Offline);
        StateRecord {
            device_id: self.device_id,
            site_id: self.site_id,
            category: self.category,
            status,
            last_update: self.last_update,
            last_change: self.last_change,
        }
    }
}
