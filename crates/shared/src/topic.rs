//! Parsing for the hierarchical device status topic.
//!
//! Device status messages arrive over a publish/subscribe channel keyed by
//! topics of the form `org/{siteId}/devices/{deviceId}/status`. Bridge
//! processes use this parser to validate topic-derived identity against the
//! message payload before forwarding to the ingest endpoint.

use thiserror::Error;
use uuid::Uuid;

/// Error type for status topic parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    #[error("Topic must have the form org/{{siteId}}/devices/{{deviceId}}/status")]
    InvalidShape,
    #[error("Invalid device ID in topic")]
    InvalidDeviceId,
    #[error("Empty site ID in topic")]
    EmptySiteId,
}

/// Identity carried by a device status topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTopic {
    pub site_id: String,
    pub device_id: Uuid,
}

/// Parses `org/{siteId}/devices/{deviceId}/status` into its identity parts.
pub fn parse_status_topic(topic: &str) -> Result<StatusTopic, TopicError> {
    let parts: Vec<&str> = topic.split('/').collect();
    match parts.as_slice() {
        ["org", site_id, "devices", device_id, "status"] => {
            if site_id.is_empty() {
                return Err(TopicError::EmptySiteId);
            }
            let device_id = Uuid::parse_str(device_id).map_err(|_| TopicError::InvalidDeviceId)?;
            Ok(StatusTopic {
                site_id: (*site_id).to_string(),
                device_id,
            })
        }
        _ => Err(TopicError::InvalidShape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_topic() {
        let topic = "org/gym-01/devices/550e8400-e29b-41d4-a716-446655440000/status";
        let parsed = parse_status_topic(topic).unwrap();
        assert_eq!(parsed.site_id, "gym-01");
        assert_eq!(
            parsed.device_id,
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
        );
    }

    #[test]
    fn test_parse_wrong_prefix() {
        let topic = "site/gym-01/devices/550e8400-e29b-41d4-a716-446655440000/status";
        assert_eq!(parse_status_topic(topic), Err(TopicError::InvalidShape));
    }

    #[test]
    fn test_parse_wrong_suffix() {
        let topic = "org/gym-01/devices/550e8400-e29b-41d4-a716-446655440000/state";
        assert_eq!(parse_status_topic(topic), Err(TopicError::InvalidShape));
    }

    #[test]
    fn test_parse_missing_segment() {
        assert_eq!(
            parse_status_topic("org/gym-01/devices/status"),
            Err(TopicError::InvalidShape)
        );
    }

    #[test]
    fn test_parse_invalid_device_id() {
        let topic = "org/gym-01/devices/not-a-uuid/status";
        assert_eq!(parse_status_topic(topic), Err(TopicError::InvalidDeviceId));
    }

    #[test]
    fn test_parse_empty_site() {
        let topic = "org//devices/550e8400-e29b-41d4-a716-446655440000/status";
        assert_eq!(parse_status_topic(topic), Err(TopicError::EmptySiteId));
    }
}
