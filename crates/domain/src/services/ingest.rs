//! Ingest classification: the single place raw readings are interpreted.
//!
//! Downstream components only ever see the closed [`IngestDecision`]
//! variants; nothing past this boundary re-inspects raw message shape.
//! Malformed input never reaches this function — it is rejected by DTO
//! validation at the route layer.

use crate::models::device::EquipmentStatus;
use crate::models::state_record::StateRecord;

/// Decision for one well-formed reading against the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestDecision {
    /// Timestamp older than the stored `last_update`: discard. Expected
    /// under at-least-once, out-of-order delivery; not an error.
    Stale,
    /// Same status as stored: advance `last_update` only, no event.
    Heartbeat,
    /// Genuine status change: write state, append event, notify.
    Transition { from_status: EquipmentStatus },
}

/// Status assumed for a device that has never reported. A first reading is
/// therefore a transition out of `offline` (unless it reports `offline`,
/// which initializes state as a heartbeat).
pub const INITIAL_STATUS: EquipmentStatus = EquipmentStatus::Offline;

/// Classifies a reading against the current state record, if any.
///
/// Per-device ordering is enforced here: a timestamp strictly older than
/// the stored `last_update` is stale. A timestamp equal to the stored one
/// re-applies as a heartbeat/transition, which keeps the decision
/// idempotent under at-least-once redelivery of the same message.
pub fn classify(
    status: EquipmentStatus,
    timestamp: i64,
    current: Option<&StateRecord>,
) -> IngestDecision {
    let previous_status = match current {
        Some(record) => {
            if timestamp < record.last_update {
                return IngestDecision::Stale;
            }
            record.status
        }
        None => INITIAL_STATUS,
    };

    if status == previous_status {
        IngestDecision::Heartbeat
    } else {
        IngestDecision::Transition {
            from_status: previous_status,
        }
    }
}
