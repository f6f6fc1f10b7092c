//! Aggregation job: rolls closed windows of transition events into
//! occupancy bins, catching up one window at a time after failed ticks or
//! downtime.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::scheduler::{Job, JobFrequency};
use crate::config::AggregationConfig;
use domain::models::device::EquipmentStatus;
use domain::services::aggregation::{aggregate_window, DeviceWindow};
use persistence::entities::{DeviceStateEntity, TransitionEventEntity};
use persistence::repositories::{
    AggregateBinRepository, DeviceStateRepository, PreBinStatus, TransitionEventRepository,
};

/// Computes and upserts occupancy bins for every closed window above the
/// aggregated-through watermark, advancing the watermark per window. The
/// watermark only moves past a window once its bins are durably written,
/// so the cleanup job can never delete events aggregation has not
/// consumed, and a failed tick is retried from the same window.
pub struct AggregationJob {
    states: DeviceStateRepository,
    events: TransitionEventRepository,
    bins: AggregateBinRepository,
    bin_width_ms: i64,
    bin_width_minutes: u64,
    event_retention_ms: i64,
    aggregated_through: Arc<AtomicI64>,
}

impl AggregationJob {
    pub fn new(
        pool: PgPool,
        config: &AggregationConfig,
        aggregated_through: Arc<AtomicI64>,
    ) -> Self {
        Self {
            states: DeviceStateRepository::new(pool.clone()),
            events: TransitionEventRepository::new(pool.clone()),
            bins: AggregateBinRepository::new(pool),
            bin_width_ms: config.bin_width_ms(),
            bin_width_minutes: config.bin_width_minutes,
            event_retention_ms: i64::from(config.event_retention_hours) * 3_600_000,
            aggregated_through,
        }
    }
}

/// First window start to aggregate. A warm process resumes from its
/// watermark; a fresh one recovers it from the stored bins, or starts at
/// the newest closed window when no bin was ever written. Catch-up never
/// reaches below the event retention floor, where the inputs may already
/// be gone.
fn catchup_from(
    watermark: i64,
    persisted: Option<i64>,
    boundary: i64,
    bin_width_ms: i64,
    retention_floor: i64,
) -> i64 {
    let resume = if watermark > 0 {
        watermark
    } else {
        persisted.unwrap_or(boundary - bin_width_ms)
    };
    resume.max(retention_floor)
}

#[async_trait::async_trait]
impl Job for AggregationJob {
    fn name(&self) -> &'static str {
        "aggregation"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.bin_width_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let now_ms = Utc::now().timestamp_millis();
        // Everything up to the current bin boundary is closed.
        let boundary = shared::timebin::bin_start(now_ms, self.bin_width_ms);
        let retention_floor =
            shared::timebin::bin_start(now_ms - self.event_retention_ms, self.bin_width_ms);

        let watermark = self.aggregated_through.load(Ordering::SeqCst);
        let persisted = if watermark == 0 {
            self.bins
                .latest_window_end()
                .await
                .map_err(|e| format!("Failed to recover watermark: {}", e))?
        } else {
            None
        };

        let mut window_start = catchup_from(
            watermark,
            persisted,
            boundary,
            self.bin_width_ms,
            retention_floor,
        );
        if window_start >= boundary {
            debug!(watermark = window_start, "No closed window to aggregate");
            return Ok(());
        }

        let snapshot = self
            .states
            .snapshot_all()
            .await
            .map_err(|e| format!("Failed to load state snapshot: {}", e))?;

        while window_start < boundary {
            let window_end = window_start + self.bin_width_ms;

            let events = self
                .events
                .events_in_window(window_start, window_end)
                .await
                .map_err(|e| format!("Failed to load window events: {}", e))?;
            let pre = self
                .events
                .latest_status_before(window_start)
                .await
                .map_err(|e| format!("Failed to load pre-bin statuses: {}", e))?;

            let windows = build_windows(&events, &pre, &snapshot);
            let bins = aggregate_window(window_start, self.bin_width_ms, &windows);

            let written = self
                .bins
                .upsert_bins(&bins)
                .await
                .map_err(|e| format!("Failed to upsert bins: {}", e))?;

            // Advance only after the window's bins are written; a failure
            // above leaves the watermark on the last consumed window.
            self.aggregated_through.store(window_end, Ordering::SeqCst);

            info!(
                window_start,
                window_end,
                devices = windows.len(),
                events = events.len(),
                bins_written = written,
                "Aggregated closed window"
            );
            window_start = window_end;
        }
        Ok(())
    }
}

fn parse_status(raw: &str) -> EquipmentStatus {
    raw.parse::<EquipmentStatus>()
        .unwrap_or(EquipmentStatus::Offline)
}

/// Builds one timeline per device for the closed window.
///
/// Devices with in-window events get their boundary status from the last
/// event before the window, falling back to the first in-window event's
/// from-status. Devices known only from the state snapshot are steady for
/// the whole bin. BTreeMap keying keeps the output order stable.
fn build_windows(
    events: &[TransitionEventEntity],
    pre: &[PreBinStatus],
    snapshot: &[DeviceStateEntity],
) -> Vec<DeviceWindow> {
    let pre_status: HashMap<Uuid, EquipmentStatus> = pre
        .iter()
        .map(|p| (p.device_id, parse_status(&p.to_status)))
        .collect();

    let mut windows: BTreeMap<Uuid, DeviceWindow> = BTreeMap::new();

    for event in events {
        let entry = windows.entry(event.device_id).or_insert_with(|| {
            // Events arrive ascending per device, so the first one seen
            // carries the status held at the boundary in its from-status.
            let initial = pre_status
                .get(&event.device_id)
                .copied()
                .unwrap_or_else(|| parse_status(&event.from_status));
            DeviceWindow {
                device_id: event.device_id,
                site_id: event.site_id.clone(),
                category: event.category.clone(),
                initial_status: initial,
                transitions: Vec::new(),
            }
        });
        entry
            .transitions
            .push((event.timestamp, parse_status(&event.to_status)));
    }

    for state in snapshot {
        if windows.contains_key(&state.device_id) {
            continue;
        }
        // The snapshot may already reflect a transition after the window
        // closed; the event log before the boundary is authoritative when
        // present.
        let status = pre_status
            .get(&state.device_id)
            .copied()
            .unwrap_or_else(|| parse_status(&state.status));
        windows.insert(
            state.device_id,
            DeviceWindow::steady(
                state.device_id,
                state.site_id.clone(),
                state.category.clone(),
                status,
            ),
        );
    }

    windows.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(
        device_id: Uuid,
        from: &str,
        to: &str,
        timestamp: i64,
    ) -> TransitionEventEntity {
        TransitionEventEntity {
            id: Uuid::new_v4(),
            device_id,
            site_id: "gym-01".to_string(),
            category: "cardio".to_string(),
            from_status: from.to_string(),
            to_status: to.to_string(),
            timestamp,
            created_at: Utc::now(),
        }
    }

    fn state(device_id: Uuid, status: &str) -> DeviceStateEntity {
        DeviceStateEntity {
            device_id,
            site_id: "gym-01".to_string(),
            category: "cardio".to_string(),
            status: status.to_string(),
            last_update: 1_000,
            last_change: 1_000,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_windows_seeds_from_pre_bin_status() {
        let device_id = Uuid::new_v4();
        let pre = vec![PreBinStatus {
            device_id,
            to_status: "occupied".to_string(),
        }];
        let events = vec![event(device_id, "occupied", "free", 5_000)];

        let windows = build_windows(&events, &pre, &[]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].initial_status, EquipmentStatus::Occupied);
        assert_eq!(
            windows[0].transitions,
            vec![(5_000, EquipmentStatus::Free)]
        );
    }

    #[test]
    fn test_build_windows_falls_back_to_from_status() {
        let device_id = Uuid::new_v4();
        let events = vec![
            event(device_id, "free", "occupied", 2_000),
            event(device_id, "occupied", "free", 8_000),
        ];

        let windows = build_windows(&events, &[], &[]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].initial_status, EquipmentStatus::Free);
        assert_eq!(windows[0].transitions.len(), 2);
    }

    #[test]
    fn test_build_windows_steady_device_from_snapshot() {
        let device_id = Uuid::new_v4();
        let snapshot = vec![state(device_id, "free")];

        let windows = build_windows(&[], &[], &snapshot);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].initial_status, EquipmentStatus::Free);
        assert!(windows[0].transitions.is_empty());
    }

    #[test]
    fn test_build_windows_pre_bin_status_beats_snapshot() {
        // Device transitioned after the window closed; its snapshot is
        // newer than the window being aggregated.
        let device_id = Uuid::new_v4();
        let pre = vec![PreBinStatus {
            device_id,
            to_status: "occupied".to_string(),
        }];
        let snapshot = vec![state(device_id, "free")];

        let windows = build_windows(&[], &pre, &snapshot);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].initial_status, EquipmentStatus::Occupied);
    }

    #[test]
    fn test_build_windows_no_duplicate_for_device_in_both() {
        let device_id = Uuid::new_v4();
        let events = vec![event(device_id, "free", "occupied", 3_000)];
        let snapshot = vec![state(device_id, "occupied")];

        let windows = build_windows(&events, &[], &snapshot);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].transitions.len(), 1);
    }

    #[test]
    fn test_build_windows_unknown_status_reads_as_offline() {
        let device_id = Uuid::new_v4();
        let snapshot = vec![state(device_id, "bogus")];

        let windows = build_windows(&[], &[], &snapshot);
        assert_eq!(windows[0].initial_status, EquipmentStatus::Offline);
    }

    const WIDTH: i64 = 900_000;

    #[test]
    fn test_catchup_resumes_from_watermark() {
        // Two ticks failed; the next run must revisit both missed windows
        assert_eq!(
            catchup_from(10 * WIDTH, None, 13 * WIDTH, WIDTH, 0),
            10 * WIDTH
        );
    }

    #[test]
    fn test_catchup_recovers_persisted_watermark() {
        // Fresh process: resume from the stored bins, not from `now`
        assert_eq!(
            catchup_from(0, Some(11 * WIDTH), 13 * WIDTH, WIDTH, 0),
            11 * WIDTH
        );
    }

    #[test]
    fn test_catchup_without_history_takes_newest_closed_window() {
        assert_eq!(catchup_from(0, None, 13 * WIDTH, WIDTH, 0), 12 * WIDTH);
    }

    #[test]
    fn test_catchup_clamped_to_retention_floor() {
        // Stalled far past retention: do not chase windows whose events
        // are already deleted
        assert_eq!(
            catchup_from(2 * WIDTH, None, 500 * WIDTH, WIDTH, 300 * WIDTH),
            300 * WIDTH
        );
    }

    #[test]
    fn test_catchup_caught_up_yields_no_window() {
        let from = catchup_from(13 * WIDTH, None, 13 * WIDTH, WIDTH, 0);
        assert!(from >= 13 * WIDTH);
    }
}
