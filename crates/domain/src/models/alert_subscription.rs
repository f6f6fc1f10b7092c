//! Alert subscription domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle state of an alert subscription.
///
/// `Fired`, `Cancelled` and `Expired` are terminal; no transition leaves
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Fired,
    Cancelled,
    Expired,
}

impl AlertStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Fired => "fired",
            AlertStatus::Cancelled => "cancelled",
            AlertStatus::Expired => "expired",
        }
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AlertStatus::Active)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "fired" => Ok(AlertStatus::Fired),
            "cancelled" => Ok(AlertStatus::Cancelled),
            "expired" => Ok(AlertStatus::Expired),
            _ => Err(format!(
                "Invalid alert status: {}. Must be one of: active, fired, cancelled, expired",
                s
            )),
        }
    }
}

/// A daily quiet window during which alert delivery is suppressed.
///
/// Boundaries are minutes since UTC midnight. When `start > end` the window
/// wraps across midnight (e.g. 22:00-07:00). Suppression does not consume
/// the subscription; it stays eligible for the next qualifying transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub start_minute: i32,
    pub end_minute: i32,
}

impl QuietHours {
    /// Whether `minute_of_day` falls inside the quiet window.
    ///
    /// The window is half-open `[start, end)`; a wraparound window covers
    /// `[start, 1440) ∪ [0, end)`.
    pub fn contains(&self, minute_of_day: i32) -> bool {
        if self.start_minute == self.end_minute {
            // Degenerate window suppresses nothing
            return false;
        }
        if self.start_minute < self.end_minute {
            (self.start_minute..self.end_minute).contains(&minute_of_day)
        } else {
            minute_of_day >= self.start_minute || minute_of_day < self.end_minute
        }
    }
}

/// A per-user "notify me when this device is free" subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSubscription {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub status: AlertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fired_at: Option<DateTime<Utc>>,
}

/// Request payload for creating an alert subscription.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub user_id: Uuid,
    pub device_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_minute_of_day"))]
    pub quiet_start_minute: Option<i32>,

    #[validate(custom(function = "shared::validation::validate_minute_of_day"))]
    pub quiet_end_minute: Option<i32>,

    /// Time-to-live in minutes (default 120, max 24h).
    #[validate(range(min = 1, max = 1440, message = "TTL must be between 1 and 1440 minutes"))]
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
}

fn default_ttl_minutes() -> i64 {
    120
}

impl CreateAlertRequest {
    /// Quiet hours require both boundaries; a single boundary is rejected at
    /// the route layer.
    pub fn quiet_hours(&self) -> Option<QuietHours> {
        match (self.quiet_start_minute, self.quiet_end_minute) {
            (Some(start_minute), Some(end_minute)) => Some(QuietHours {
                start_minute,
                end_minute,
            }),
            _ => None,
        }
    }

    pub fn has_partial_quiet_hours(&self) -> bool {
        self.quiet_start_minute.is_some() != self.quiet_end_minute.is_some()
    }
}

/// Response payload for alert subscription operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub status: AlertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fired_at: Option<DateTime<Utc>>,
}

impl From<AlertSubscription> for AlertResponse {
    fn from(a: AlertSubscription) -> Self {
        Self {
            alert_id: a.alert_id,
            user_id: a.user_id,
            device_id: a.device_id,
            status: a.status,
            quiet_hours: a.quiet_hours,
            created_at: a.created_at,
            expires_at: a.expires_at,
            fired_at: a.fired_at,
        }
    }
}

/// Response for listing alert subscriptions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsResponse {
    pub alerts: Vec<AlertResponse>,
    pub total: usize,
}

/// Notification payload pushed when an alert fires.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFiredNotification {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    /// Event timestamp of the freeing transition (epoch ms).
    pub freed_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_alert_status_round_trip() {
        for status in [
            AlertStatus::Active,
            AlertStatus::Fired,
            AlertStatus::Cancelled,
            AlertStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<AlertStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_alert_status_from_str_invalid() {
        assert!("done".parse::<AlertStatus>().is_err());
        assert!("ACTIVE".parse::<AlertStatus>().is_err());
    }

    #[test]
    fn test_alert_status_terminal() {
        assert!(!AlertStatus::Active.is_terminal());
        assert!(AlertStatus::Fired.is_terminal());
        assert!(AlertStatus::Cancelled.is_terminal());
        assert!(AlertStatus::Expired.is_terminal());
    }

    #[test]
    fn test_quiet_hours_simple_window() {
        // 08:00-17:00
        let q = QuietHours {
            start_minute: 8 * 60,
            end_minute: 17 * 60,
        };
        assert!(q.contains(12 * 60));
        assert!(q.contains(8 * 60)); // inclusive start
        assert!(!q.contains(17 * 60)); // exclusive end
        assert!(!q.contains(7 * 60));
        assert!(!q.contains(23 * 60));
    }

    #[test]
    fn test_quiet_hours_wraparound() {
        // 22:00-07:00, spanning midnight
        let q = QuietHours {
            start_minute: 22 * 60,
            end_minute: 7 * 60,
        };
        assert!(q.contains(23 * 60));
        assert!(q.contains(0));
        assert!(q.contains(6 * 60 + 59));
        assert!(q.contains(22 * 60));
        assert!(!q.contains(7 * 60));
        assert!(!q.contains(9 * 60));
        assert!(!q.contains(12 * 60));
    }

    #[test]
    fn test_quiet_hours_degenerate() {
        let q = QuietHours {
            start_minute: 600,
            end_minute: 600,
        };
        assert!(!q.contains(600));
        assert!(!q.contains(0));
    }

    #[test]
    fn test_create_alert_request_defaults() {
        let json = r#"{
            "userId": "550e8400-e29b-41d4-a716-446655440000",
            "deviceId": "550e8400-e29b-41d4-a716-446655440001"
        }"#;
        let request: CreateAlertRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.ttl_minutes, 120);
        assert!(request.quiet_hours().is_none());
        assert!(!request.has_partial_quiet_hours());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_alert_request_with_quiet_hours() {
        let json = r#"{
            "userId": "550e8400-e29b-41d4-a716-446655440000",
            "deviceId": "550e8400-e29b-41d4-a716-446655440001",
            "quietStartMinute": 1320,
            "quietEndMinute": 420,
            "ttlMinutes": 60
        }"#;
        let request: CreateAlertRequest = serde_json::from_str(json).unwrap();
        let quiet = request.quiet_hours().unwrap();
        assert_eq!(quiet.start_minute, 1320);
        assert_eq!(quiet.end_minute, 420);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_alert_request_partial_quiet_hours() {
        let json = r#"{
            "userId": "550e8400-e29b-41d4-a716-446655440000",
            "deviceId": "550e8400-e29b-41d4-a716-446655440001",
            "quietStartMinute": 1320
        }"#;
        let request: CreateAlertRequest = serde_json::from_str(json).unwrap();
        assert!(request.has_partial_quiet_hours());
        assert!(request.quiet_hours().is_none());
    }

    #[test]
    fn test_create_alert_request_invalid_minute() {
        let json = r#"{
            "userId": "550e8400-e29b-41d4-a716-446655440000",
            "deviceId": "550e8400-e29b-41d4-a716-446655440001",
            "quietStartMinute": 1440,
            "quietEndMinute": 420
        }"#;
        let request: CreateAlertRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_alert_request_invalid_ttl() {
        let json = r#"{
            "userId": "550e8400-e29b-41d4-a716-446655440000",
            "deviceId": "550e8400-e29b-41d4-a716-446655440001",
            "ttlMinutes": 10000
        }"#;
        let request: CreateAlertRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_alert_response_serialization() {
        let response = AlertResponse {
            alert_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            status: AlertStatus::Active,
            quiet_hours: None,
            created_at: Utc::now(),
            expires_at: Utc::now(),
            fired_at: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"active\""));
        // Should skip None fields
        assert!(!json.contains("quietHours"));
        assert!(!json.contains("firedAt"));
    }
}
