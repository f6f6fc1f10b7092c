//! Window aggregation: rolls the transition log into fixed-width occupancy
//! bins per `(site, category)`.
//!
//! The engine is a pure function of `(window, per-device timelines)`, so it
//! is independent of how it is triggered and re-running it for the same
//! window is idempotent by construction. Only events with
//! `timestamp < window_end` may appear in the inputs; late arrivals for an
//! already-closed window are dropped by the caller rather than mutating a
//! published bin.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::aggregate_bin::AggregateBin;
use crate::models::device::EquipmentStatus;

/// One device's status timeline across a single bin.
#[derive(Debug, Clone)]
pub struct DeviceWindow {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    /// Status held at the bin start (from the last event before the bin, or
    /// the state snapshot for devices with no transitions at all).
    pub initial_status: EquipmentStatus,
    /// In-bin transitions as `(timestamp, to_status)`, ascending.
    pub transitions: Vec<(i64, EquipmentStatus)>,
}

impl DeviceWindow {
    /// A device with no transitions in the bin; its snapshot status holds
    /// for the whole window. Counting these avoids undercounting
    /// steady-state occupancy.
    pub fn steady(
        device_id: Uuid,
        site_id: impl Into<String>,
        category: impl Into<String>,
        status: EquipmentStatus,
    ) -> Self {
        Self {
            device_id,
            site_id: site_id.into(),
            category: category.into(),
            initial_status: status,
            transitions: Vec::new(),
        }
    }
}

/// Milliseconds a device spent `free` inside `[bin_start, bin_start + width)`.
fn free_millis(window: &DeviceWindow, bin_start: i64, bin_width: i64) -> i64 {
    let bin_end = bin_start + bin_width;
    let mut free_ms = 0i64;
    let mut current = window.initial_status;
    let mut held_since = bin_start;

    for &(timestamp, to_status) in &window.transitions {
        let at = timestamp.clamp(bin_start, bin_end);
        if current == EquipmentStatus::Free {
            free_ms += at - held_since;
        }
        current = to_status;
        held_since = at;
    }

    if current == EquipmentStatus::Free {
        free_ms += bin_end - held_since;
    }

    free_ms
}

/// Rounds a device to its majority status: free iff it was free for at
/// least half the bin, time-weighted. Offline time counts toward the
/// occupied side of the ratio.
fn is_majority_free(window: &DeviceWindow, bin_start: i64, bin_width: i64) -> bool {
    2 * free_millis(window, bin_start, bin_width) >= bin_width
}

/// Computes the aggregate bins for one closed window.
///
/// `total_count` is the number of distinct devices observed per
/// `(site, category)`; `free_count` the number whose majority status was
/// free. Output is ordered by key, so identical inputs serialize
/// identically.
pub fn aggregate_window(
    bin_start: i64,
    bin_width: i64,
    devices: &[DeviceWindow],
) -> Vec<AggregateBin> {
    debug_assert!(bin_width > 0);

    let mut counts: BTreeMap<(String, String), (i64, i64)> = BTreeMap::new();

    for window in devices {
        let key = (window.site_id.clone(), window.category.clone());
        let entry = counts.entry(key).or_insert((0, 0));
        entry.1 += 1;
        if is_majority_free(window, bin_start, bin_width) {
            entry.0 += 1;
        }
    }

    counts
        .into_iter()
        .map(|((site_id, category), (free_count, total_count))| AggregateBin {
            site_id,
            category,
            bin_start,
            bin_width,
            free_count,
            total_count,
        })
        .collect()
}
