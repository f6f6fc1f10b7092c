//! Availability forecasting from aggregate history and current state.
//!
//! The probability model is intentionally simple: the historical free ratio
//! for the device's `(site, category)` at the same hour-of-day/day-of-week,
//! blended with how long the device has held its current status. Thresholds
//! and sample-size requirements come from configuration so sites with thin
//! history degrade to an explicit `no_data` rather than a confident guess.

use crate::models::aggregate_bin::AggregateBin;
use crate::models::device::EquipmentStatus;
use crate::models::forecast::{ForecastClassification, ForecastResult};
use crate::models::state_record::StateRecord;

/// Tunables for forecast classification.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Probability at or above which a device is `likely_free`.
    pub high_threshold: f64,
    /// Probability at or below which a device is `unlikely_free`.
    pub low_threshold: f64,
    /// Minimum historical sample size for any non-`no_data` claim.
    pub min_samples: i64,
    /// Sample count at which confidence reaches half its cap.
    pub confidence_pivot: i64,
    /// Upper bound on reported confidence; never claim certainty.
    pub confidence_cap: f64,
    /// Typical occupancy session length, used to weight hold time.
    pub reference_hold_minutes: i64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.65,
            low_threshold: 0.35,
            min_samples: 20,
            confidence_pivot: 50,
            confidence_cap: 0.95,
            reference_hold_minutes: 20,
        }
    }
}

/// Confidence from sample size: monotone non-decreasing, zero at zero
/// samples, asymptotic to the configured cap.
pub fn confidence_for_samples(sample_size: i64, config: &ForecastConfig) -> f64 {
    if sample_size <= 0 {
        return 0.0;
    }
    let n = sample_size as f64;
    let pivot = config.confidence_pivot.max(1) as f64;
    config.confidence_cap * n / (n + pivot)
}

/// Computes a forecast for a device from its current state and the
/// aggregate bins matching its time-of-week bucket.
///
/// A currently `free` device gets a forecast of how likely it is to remain
/// free over the horizon, from the same historical distribution. An
/// `offline` device is always `no_data`: a sensor that is not reporting
/// supports no prediction either way.
pub fn forecast(
    state: &StateRecord,
    history: &[AggregateBin],
    horizon_minutes: i64,
    now_ms: i64,
    config: &ForecastConfig,
) -> ForecastResult {
    let sample_size: i64 = history.iter().map(|b| b.total_count).sum();
    let no_data = |probability: f64, sample_size: i64| ForecastResult {
        device_id: state.device_id,
        current_status: state.status,
        classification: ForecastClassification::NoData,
        probability,
        confidence: confidence_for_samples(sample_size, config),
        sample_size,
        horizon_minutes,
    };

    if sample_size <= 0 {
        return no_data(0.0, 0);
    }
    if state.status == EquipmentStatus::Offline {
        return no_data(0.0, sample_size);
    }

    let free_total: i64 = history.iter().map(|b| b.free_count).sum();
    let base_probability = (free_total as f64 / sample_size as f64).clamp(0.0, 1.0);

    let probability = match state.status {
        // Probability of remaining free: the historical free ratio for
        // this time of week.
        EquipmentStatus::Free => base_probability,
        // Probability of freeing up within the horizon: the free ratio
        // discounted by how fresh the occupancy is. A session that has
        // already run past the typical length is more likely to end.
        EquipmentStatus::Occupied => {
            let horizon_ms = horizon_minutes * 60_000;
            let reference_ms = config.reference_hold_minutes.max(1) * 60_000;
            let held_ms = state.held_for_ms(now_ms);
            let hold_weight =
                ((held_ms + horizon_ms) as f64 / (reference_ms + horizon_ms) as f64).min(1.0);
            (base_probability * hold_weight).clamp(0.0, 1.0)
        }
        EquipmentStatus::Offline => unreachable!("offline handled above"),
    };

    let classification = if sample_size < config.min_samples {
        ForecastClassification::NoData
    } else if probability >= config.high_threshold {
        ForecastClassification::LikelyFree
    } else if probability <= config.low_threshold {
        ForecastClassification::UnlikelyFree
    } else {
        ForecastClassification::NoData
    };

    ForecastResult {
        device_id: state.device_id,
        current_status: state.status,
        classification,
        probability,
        confidence: confidence_for_samples(sample_size, config),
        sample_size,
        horizon_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn state(status: EquipmentStatus, last_change: i64) -> StateRecord {
        StateRecord {
            device_id: Uuid::new_v4(),
            site_id: "gym-01".to_string(),
            category: "legs".to_string(),
            status,
            last_update: last_change,
            last_change,
        }
    }

    fn bins(free: i64, total: i64, count: usize) -> Vec<AggregateBin> {
        (0..count)
            .map(|i| AggregateBin {
                site_id: "gym-01".to_string(),
                category: "legs".to_string(),
                bin_start: i as i64 * 900_000,
                bin_width: 900_000,
                free_count: free,
                total_count: total,
            })
            .collect()
    }

    const NOW: i64 = 100_000_000;

    #[test]
    fn test_zero_history_is_no_data() {
        let result = forecast(
            &state(EquipmentStatus::Occupied, NOW - 60_000),
            &[],
            30,
            NOW,
            &ForecastConfig::default(),
        );
        assert_eq!(result.classification, ForecastClassification::NoData);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.sample_size, 0);
    }

    #[test]
    fn test_mostly_free_history_occupied_long_hold() {
        // 9 of 10 devices historically free; device occupied well past the
        // reference session length.
        let config = ForecastConfig::default();
        let result = forecast(
            &state(EquipmentStatus::Occupied, NOW - 40 * 60_000),
            &bins(9, 10, 10),
            30,
            NOW,
            &config,
        );
        assert_eq!(result.classification, ForecastClassification::LikelyFree);
        assert!(result.probability >= config.high_threshold);
        assert_eq!(result.sample_size, 100);
    }

    #[test]
    fn test_busy_history_is_unlikely_free() {
        // 1 of 10 devices historically free at this time of week
        let result = forecast(
            &state(EquipmentStatus::Occupied, NOW - 5 * 60_000),
            &bins(1, 10, 10),
            30,
            NOW,
            &ForecastConfig::default(),
        );
        assert_eq!(result.classification, ForecastClassification::UnlikelyFree);
    }

    #[test]
    fn test_thin_history_is_no_data_not_negative() {
        // Strong signal but below min_samples must stay no_data
        let config = ForecastConfig {
            min_samples: 50,
            ..ForecastConfig::default()
        };
        let result = forecast(
            &state(EquipmentStatus::Occupied, NOW - 60_000),
            &bins(0, 10, 2), // 20 samples, all occupied
            30,
            NOW,
            &config,
        );
        assert_eq!(result.classification, ForecastClassification::NoData);
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn test_free_device_remain_free_forecast() {
        let result = forecast(
            &state(EquipmentStatus::Free, NOW - 10 * 60_000),
            &bins(8, 10, 10),
            30,
            NOW,
            &ForecastConfig::default(),
        );
        assert_eq!(result.current_status, EquipmentStatus::Free);
        assert_eq!(result.classification, ForecastClassification::LikelyFree);
        assert!((result.probability - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_offline_device_is_no_data() {
        let result = forecast(
            &state(EquipmentStatus::Offline, NOW - 60_000),
            &bins(8, 10, 10),
            30,
            NOW,
            &ForecastConfig::default(),
        );
        assert_eq!(result.classification, ForecastClassification::NoData);
    }

    #[test]
    fn test_probability_monotone_in_hold_time() {
        let history = bins(6, 10, 10);
        let config = ForecastConfig::default();
        let mut last = 0.0;
        for held_minutes in [0, 5, 10, 20, 40, 80] {
            let result = forecast(
                &state(EquipmentStatus::Occupied, NOW - held_minutes * 60_000),
                &history,
                30,
                NOW,
                &config,
            );
            assert!(
                result.probability >= last,
                "probability decreased at hold {}",
                held_minutes
            );
            last = result.probability;
        }
    }

    #[test]
    fn test_confidence_monotone_in_sample_size() {
        let config = ForecastConfig::default();
        let mut last = -1.0;
        for n in [0, 1, 5, 20, 50, 200, 10_000] {
            let c = confidence_for_samples(n, &config);
            assert!(c >= last);
            last = c;
        }
    }

    #[test]
    fn test_confidence_capped() {
        let config = ForecastConfig::default();
        assert!(confidence_for_samples(i64::MAX / 2, &config) <= config.confidence_cap);
    }

    #[test]
    fn test_probability_stays_in_unit_interval() {
        let config = ForecastConfig {
            reference_hold_minutes: 1,
            ..ForecastConfig::default()
        };
        let result = forecast(
            &state(EquipmentStatus::Occupied, NOW - 500 * 60_000),
            &bins(10, 10, 10),
            30,
            NOW,
            &config,
        );
        assert!((0.0..=1.0).contains(&result.probability));
    }
}
