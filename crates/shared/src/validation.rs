//! Common validation utilities.

use chrono::{TimeZone, Utc};
use validator::ValidationError;

/// Maximum age of a timestamp in days (7 days).
const MAX_TIMESTAMP_AGE_DAYS: i64 = 7;

/// Maximum allowed future timestamp tolerance in seconds (5 minutes for clock skew).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 300;

/// Maximum length of a site identifier.
const MAX_SITE_ID_LENGTH: usize = 64;

/// Maximum length of an equipment category tag.
const MAX_CATEGORY_LENGTH: usize = 64;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a site identifier (non-empty, bounded length, URL-safe characters).
pub fn validate_site_id(site_id: &str) -> Result<(), ValidationError> {
    if site_id.is_empty() || site_id.len() > MAX_SITE_ID_LENGTH {
        let mut err = ValidationError::new("site_id_length");
        err.message = Some("Site ID must be between 1 and 64 characters".into());
        return Err(err);
    }
    if !site_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("site_id_charset");
        err.message =
            Some("Site ID may only contain alphanumerics, hyphens and underscores".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an equipment category tag (non-empty, bounded length, URL-safe characters).
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.is_empty() || category.len() > MAX_CATEGORY_LENGTH {
        let mut err = ValidationError::new("category_length");
        err.message = Some("Category must be between 1 and 64 characters".into());
        return Err(err);
    }
    if !category
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("category_charset");
        err.message =
            Some("Category may only contain alphanumerics, hyphens and underscores".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a timestamp (in milliseconds since epoch) is within acceptable range.
/// - Must not be more than 5 minutes in the future (allows for clock skew)
/// - Must not be older than 7 days
///
/// Note: a timestamp older than the stored state for a device is *not* a
/// validation error; staleness is decided against per-device state at ingest.
pub fn validate_timestamp(timestamp_millis: i64) -> Result<(), ValidationError> {
    let now = Utc::now();

    let timestamp = match Utc.timestamp_millis_opt(timestamp_millis).single() {
        Some(ts) => ts,
        None => {
            let mut err = ValidationError::new("timestamp_invalid");
            err.message = Some("Invalid timestamp format".into());
            return Err(err);
        }
    };

    let future_limit = now + chrono::Duration::seconds(MAX_FUTURE_TOLERANCE_SECS);
    if timestamp > future_limit {
        let mut err = ValidationError::new("timestamp_future");
        err.message = Some("Timestamp cannot be in the future".into());
        return Err(err);
    }

    let past_limit = now - chrono::Duration::days(MAX_TIMESTAMP_AGE_DAYS);
    if timestamp < past_limit {
        let mut err = ValidationError::new("timestamp_old");
        err.message = Some("Timestamp cannot be older than 7 days".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a quiet-hours boundary is a minute of day (0..=1439).
pub fn validate_minute_of_day(minute: i32) -> Result<(), ValidationError> {
    if (0..1440).contains(&minute) {
        Ok(())
    } else {
        let mut err = ValidationError::new("minute_of_day_range");
        err.message = Some("Minute of day must be between 0 and 1439".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Latitude tests
    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    // Longitude tests
    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    // Site ID tests
    #[test]
    fn test_validate_site_id() {
        assert!(validate_site_id("gym-01").is_ok());
        assert!(validate_site_id("main_floor").is_ok());
        assert!(validate_site_id("S1").is_ok());
        assert!(validate_site_id("").is_err());
        assert!(validate_site_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_site_id_charset() {
        assert!(validate_site_id("gym 01").is_err());
        assert!(validate_site_id("gym/01").is_err());
        assert!(validate_site_id("gym#01").is_err());
    }

    // Category tests
    #[test]
    fn test_validate_category() {
        assert!(validate_category("legs").is_ok());
        assert!(validate_category("chest").is_ok());
        assert!(validate_category("free-weights").is_ok());
        assert!(validate_category("").is_err());
        assert!(validate_category(&"c".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_category_charset() {
        assert!(validate_category("legs!").is_err());
        assert!(validate_category("upper body").is_err());
    }

    // Timestamp tests
    #[test]
    fn test_validate_timestamp_current() {
        let now_millis = Utc::now().timestamp_millis();
        assert!(validate_timestamp(now_millis).is_ok());
    }

    #[test]
    fn test_validate_timestamp_recent_past() {
        let one_hour_ago = Utc::now() - chrono::Duration::hours(1);
        assert!(validate_timestamp(one_hour_ago.timestamp_millis()).is_ok());

        let six_days_ago = Utc::now() - chrono::Duration::days(6);
        assert!(validate_timestamp(six_days_ago.timestamp_millis()).is_ok());
    }

    #[test]
    fn test_validate_timestamp_too_old() {
        let eight_days_ago = Utc::now() - chrono::Duration::days(8);
        assert!(validate_timestamp(eight_days_ago.timestamp_millis()).is_err());
    }

    #[test]
    fn test_validate_timestamp_slight_future() {
        // Within the 5 minute clock skew tolerance
        let four_min_future = Utc::now() + chrono::Duration::minutes(4);
        assert!(validate_timestamp(four_min_future.timestamp_millis()).is_ok());
    }

    #[test]
    fn test_validate_timestamp_too_far_future() {
        let ten_min_future = Utc::now() + chrono::Duration::minutes(10);
        assert!(validate_timestamp(ten_min_future.timestamp_millis()).is_err());
    }

    #[test]
    fn test_validate_timestamp_future_error_message() {
        let far_future = Utc::now() + chrono::Duration::hours(1);
        let err = validate_timestamp(far_future.timestamp_millis()).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Timestamp cannot be in the future"
        );
    }

    // Minute-of-day tests
    #[test]
    fn test_validate_minute_of_day() {
        assert!(validate_minute_of_day(0).is_ok());
        assert!(validate_minute_of_day(1439).is_ok());
        assert!(validate_minute_of_day(720).is_ok());
        assert!(validate_minute_of_day(-1).is_err());
        assert!(validate_minute_of_day(1440).is_err());
    }
}
