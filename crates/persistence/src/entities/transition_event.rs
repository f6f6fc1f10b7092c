//! Transition event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::device::EquipmentStatus;
use domain::models::status_event::TransitionEvent;

/// Database row mapping for the transition_events table.
#[derive(Debug, Clone, FromRow)]
pub struct TransitionEventEntity {
    pub id: Uuid,
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub from_status: String,
    pub to_status: String,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl TransitionEventEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> TransitionEvent {
        TransitionEvent {
            id: self.id,
            device_id: self.device_id,
            site_id: self.site_id,
            category: self.category,
            from_status: self
                .from_status
                .parse::<EquipmentStatus>()
                .unwrap_or(EquipmentStatus::Offline),
            to_status: self
                .to_status
                .parse::<EquipmentStatus>()
                .unwrap_or(EquipmentStatus::Offline),
            timestamp: self.timestamp,
            created_at: self.created_at,
        }
    }
}
