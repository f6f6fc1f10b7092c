//! Availability forecast endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::aggregate_bin::AggregateBin;
use domain::models::forecast::ForecastResult;
use domain::services::forecast::forecast;
use persistence::repositories::{AggregateBinRepository, DeviceStateRepository};
use shared::timebin::TimeBucket;

/// Query parameters for forecast retrieval.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ForecastQuery {
    pub horizon_minutes: Option<i64>,
}

/// Forecast near-term availability for a device.
///
/// GET /api/v1/devices/:device_id/forecast?horizon_minutes=
///
/// History is restricted to aggregate bins in the same hour-of-day and
/// day-of-week bucket as now, over the configured lookback. Thin history
/// yields an explicit `no_data` classification.
pub async fn get_device_forecast(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResult>, ApiError> {
    let horizon_minutes = query
        .horizon_minutes
        .unwrap_or(state.config.forecast.default_horizon_minutes);
    if !(1..=24 * 60).contains(&horizon_minutes) {
        return Err(ApiError::Validation(
            "horizon_minutes must be between 1 and 1440".to_string(),
        ));
    }

    let states = DeviceStateRepository::new(state.pool.clone());
    let record = states
        .find_by_device_id(device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device has no recorded state".to_string()))?
        .into_domain();

    let now_ms = Utc::now().timestamp_millis();
    let since_ms = now_ms - i64::from(state.config.forecast.history_days) * 86_400_000;

    let bins = AggregateBinRepository::new(state.pool.clone())
        .find_since(&record.site_id, &record.category, since_ms)
        .await?;

    let history = bucket_filter(bins.into_iter().map(|e| e.into_domain()), now_ms);

    let result = forecast(
        &record,
        &history,
        horizon_minutes,
        now_ms,
        &state.config.forecast_config(),
    );

    Ok(Json(result))
}

/// Keeps only bins in the same time-of-week bucket as `now_ms`.
fn bucket_filter(bins: impl Iterator<Item = AggregateBin>, now_ms: i64) -> Vec<AggregateBin> {
    let Some(bucket) = TimeBucket::from_timestamp_ms(now_ms) else {
        return Vec::new();
    };
    bins.filter(|bin| TimeBucket::from_timestamp_ms(bin.bin_start) == Some(bucket))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bin(bin_start: i64) -> AggregateBin {
        AggregateBin {
            site_id: "gym-01".to_string(),
            category: "legs".to_string(),
            bin_start,
            bin_width: 900_000,
            free_count: 1,
            total_count: 2,
        }
    }

    #[test]
    fn test_bucket_filter_keeps_same_time_of_week() {
        // Monday 18:xx across two weeks, plus a Monday 09:xx outlier
        let now = Utc
            .with_ymd_and_hms(2024, 3, 25, 18, 5, 0)
            .unwrap()
            .timestamp_millis();
        let same_hour_last_week = Utc
            .with_ymd_and_hms(2024, 3, 18, 18, 30, 0)
            .unwrap()
            .timestamp_millis();
        let other_hour = Utc
            .with_ymd_and_hms(2024, 3, 18, 9, 30, 0)
            .unwrap()
            .timestamp_millis();

        let kept = bucket_filter(
            vec![bin(same_hour_last_week), bin(other_hour)].into_iter(),
            now,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bin_start, same_hour_last_week);
    }

    #[test]
    fn test_bucket_filter_drops_other_weekday() {
        let monday_evening = Utc
            .with_ymd_and_hms(2024, 3, 25, 18, 5, 0)
            .unwrap()
            .timestamp_millis();
        let tuesday_evening = Utc
            .with_ymd_and_hms(2024, 3, 19, 18, 5, 0)
            .unwrap()
            .timestamp_millis();

        let kept = bucket_filter(vec![bin(tuesday_evening)].into_iter(), monday_evening);
        assert!(kept.is_empty());
    }
}
