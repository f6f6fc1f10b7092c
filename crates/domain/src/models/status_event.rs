//! Raw status event intake DTOs and the transition event log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::device::EquipmentStatus;

/// Raw per-device status message as delivered by the device layer.
///
/// Delivery is at-least-once over the status topic, so duplicates and
/// out-of-order messages are expected and resolved at ingest, not rejected.
/// Category and coordinates are optional; when absent they are filled from
/// device reference data.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawStatusEvent {
    pub device_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_site_id"))]
    pub site_id: String,

    pub status: EquipmentStatus,

    /// Event timestamp in milliseconds since epoch (device clock).
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: i64,

    #[validate(custom(function = "shared::validation::validate_category"))]
    pub category: Option<String>,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,
}

/// A genuine status change accepted by the ingest normalizer.
///
/// This is the single notification type consumed downstream (fan-out, alert
/// matching); heartbeats never produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub from_status: EquipmentStatus,
    pub to_status: EquipmentStatus,
    pub timestamp: i64,
}

/// A transition event as recorded in the append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub id: Uuid,
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub from_status: EquipmentStatus,
    pub to_status: EquipmentStatus,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&TransitionEvent> for Transition {
    fn from(e: &TransitionEvent) -> Self {
        Self {
            device_id: e.device_id,
            site_id: e.site_id.clone(),
            category: e.category.clone(),
            from_status: e.from_status,
            to_status: e.to_status,
            timestamp: e.timestamp,
        }
    }
}

/// How the ingest normalizer disposed of an accepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestDisposition {
    /// Genuine status change: state written, event appended, notification
    /// emitted.
    Transition,
    /// Same status as stored: only `last_update` advanced.
    Heartbeat,
    /// Timestamp older than stored state: discarded, no state change.
    Stale,
}

/// Response payload for the ingest endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub disposition: IngestDisposition,
    pub device_id: Uuid,
}

/// Response payload for transition history retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEventResponse {
    pub id: Uuid,
    pub from_status: EquipmentStatus,
    pub to_status: EquipmentStatus,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl From<TransitionEvent> for TransitionEventResponse {
    fn from(e: TransitionEvent) -> Self {
        Self {
            id: e.id,
            from_status: e.from_status,
            to_status: e.to_status,
            timestamp: e.timestamp,
            created_at: e.created_at,
        }
    }
}

/// Pagination envelope for history responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Response for device transition history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHistoryResponse {
    pub events: Vec<TransitionEventResponse>,
    pub pagination: HistoryPagination,
}
