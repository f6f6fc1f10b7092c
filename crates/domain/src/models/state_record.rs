//! Current-state record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::device::EquipmentStatus;

/// Latest-known status for one device.
///
/// Invariants: `last_update` is monotonically non-decreasing over accepted
/// ingest calls; `last_change` moves only when `status` differs from the
/// previously stored value. Both are epoch milliseconds from the device
/// event, not server receive time. Mutated exclusively through the
/// timestamp-fenced repository update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub status: EquipmentStatus,
    /// Event timestamp of the most recent accepted reading (epoch ms).
    pub last_update: i64,
    /// Event timestamp of the most recent genuine transition (epoch ms).
    pub last_change: i64,
}

impl StateRecord {
    /// Milliseconds the current status has been held as of `now_ms`.
    pub fn held_for_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.last_change).max(0)
    }
}

/// Response payload for a single device state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecordResponse {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    pub status: EquipmentStatus,
    pub last_update: i64,
    pub last_change: i64,
    pub updated_at: DateTime<Utc>,
}

/// Response for listing current state across a site.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStateResponse {
    pub site_id: String,
    pub devices: Vec<StateRecordResponse>,
    pub total: usize,
    pub free_count: usize,
}
