//! Device domain model and equipment status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Reported status of a single piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    Free,
    Occupied,
    Offline,
}

impl EquipmentStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Free => "free",
            EquipmentStatus::Occupied => "occupied",
            EquipmentStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(EquipmentStatus::Free),
            "occupied" => Ok(EquipmentStatus::Occupied),
            "offline" => Ok(EquipmentStatus::Offline),
            _ => Err(format!(
                "Invalid equipment status: {}. Must be one of: free, occupied, offline",
                s
            )),
        }
    }
}

/// A single monitored piece of equipment. Reference data created at
/// provisioning time; read-only to the ingest pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Request payload for registering a device (provisioning surface).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub device_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_site_id"))]
    pub site_id: String,

    #[validate(custom(function = "shared::validation::validate_category"))]
    pub category: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,
}

/// Response payload for device operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub device_id: Uuid,
    pub site_id: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<Device> for DeviceResponse {
    fn from(d: Device) -> Self {
        Self {
            device_id: d.device_id,
            site_id: d.site_id,
            category: d.category,
            latitude: d.latitude,
            longitude: d.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_equipment_status_as_str() {
        assert_eq!(EquipmentStatus::Free.as_str(), "free");
        assert_eq!(EquipmentStatus::Occupied.as_str(), "occupied");
        assert_eq!(EquipmentStatus::Offline.as_str(), "offline");
    }

    #[test]
    fn test_equipment_status_from_str() {
        assert_eq!(
            "free".parse::<EquipmentStatus>().unwrap(),
            EquipmentStatus::Free
        );
        assert_eq!(
            "occupied".parse::<EquipmentStatus>().unwrap(),
            EquipmentStatus::Occupied
        );
        assert_eq!(
            "offline".parse::<EquipmentStatus>().unwrap(),
            EquipmentStatus::Offline
        );
    }

    #[test]
    fn test_equipment_status_from_str_invalid() {
        assert!("busy".parse::<EquipmentStatus>().is_err());
        assert!("FREE".parse::<EquipmentStatus>().is_err()); // uppercase
        assert!("".parse::<EquipmentStatus>().is_err());
    }

    #[test]
    fn test_equipment_status_serde() {
        let json = serde_json::to_string(&EquipmentStatus::Occupied).unwrap();
        assert_eq!(json, "\"occupied\"");

        let parsed: EquipmentStatus = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(parsed, EquipmentStatus::Free);
    }

    #[test]
    fn test_register_device_request_valid() {
        let request = RegisterDeviceRequest {
            device_id: Uuid::new_v4(),
            site_id: "gym-01".to_string(),
            category: "legs".to_string(),
            latitude: Some(48.15),
            longitude: Some(17.11),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_device_request_invalid_site() {
        let request = RegisterDeviceRequest {
            device_id: Uuid::new_v4(),
            site_id: "gym 01".to_string(),
            category: "legs".to_string(),
            latitude: None,
            longitude: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_device_request_invalid_latitude() {
        let request = RegisterDeviceRequest {
            device_id: Uuid::new_v4(),
            site_id: "gym-01".to_string(),
            category: "legs".to_string(),
            latitude: Some(95.0),
            longitude: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_device_response_serialization() {
        let response = DeviceResponse {
            device_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            site_id: "gym-01".to_string(),
            category: "chest".to_string(),
            latitude: None,
            longitude: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"siteId\":\"gym-01\""));
        assert!(json.contains("\"category\":\"chest\""));
        // Should skip None fields
        assert!(!json.contains("latitude"));
    }
}
