//! Availability forecast domain model. Derived on demand, never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::device::EquipmentStatus;

/// Forecast classification for near-term availability.
///
/// `NoData` is a distinct outcome, not a silent default: downstream
/// consumers must not treat missing history as a negative prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastClassification {
    LikelyFree,
    UnlikelyFree,
    NoData,
}

impl fmt::Display for ForecastClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastClassification::LikelyFree => write!(f, "likely_free"),
            ForecastClassification::UnlikelyFree => write!(f, "unlikely_free"),
            ForecastClassification::NoData => write!(f, "no_data"),
        }
    }
}

/// Result of a forecast computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub device_id: Uuid,
    pub current_status: EquipmentStatus,
    pub classification: ForecastClassification,
    /// Probability the device frees up (or stays free) within the horizon.
    pub probability: f64,
    /// Confidence derived from sample size, capped below 1.0.
    pub confidence: f64,
    /// Number of historical device observations backing the probability.
    pub sample_size: i64,
    pub horizon_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_display() {
        assert_eq!(ForecastClassification::LikelyFree.to_string(), "likely_free");
        assert_eq!(
            ForecastClassification::UnlikelyFree.to_string(),
            "unlikely_free"
        );
        assert_eq!(ForecastClassification::NoData.to_string(), "no_data");
    }

    #[test]
    fn test_classification_serde() {
        let json = serde_json::to_string(&ForecastClassification::NoData).unwrap();
        assert_eq!(json, "\"no_data\"");

        let parsed: ForecastClassification = serde_json::from_str("\"likely_free\"").unwrap();
        assert_eq!(parsed, ForecastClassification::LikelyFree);
    }

    #[test]
    fn test_forecast_result_serialization() {
        let result = ForecastResult {
            device_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            current_status: EquipmentStatus::Occupied,
            classification: ForecastClassification::LikelyFree,
            probability: 0.82,
            confidence: 0.7,
            sample_size: 140,
            horizon_minutes: 30,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"classification\":\"likely_free\""));
        assert!(json.contains("\"sampleSize\":140"));
        assert!(json.contains("\"horizonMinutes\":30"));
    }
}
