//! Time-bin arithmetic for occupancy aggregation and forecasting.
//!
//! Bins are fixed-width windows aligned to absolute time (epoch
//! milliseconds), so two independent aggregation runs always agree on bin
//! boundaries. The hour-of-day/day-of-week bucket groups bins that describe
//! "the same time of week" for forecast history lookups.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// Milliseconds in one minute.
pub const MINUTE_MS: i64 = 60_000;

/// Returns the start of the bin containing `timestamp_ms`, aligned to
/// absolute time.
pub fn bin_start(timestamp_ms: i64, bin_width_ms: i64) -> i64 {
    debug_assert!(bin_width_ms > 0);
    timestamp_ms.div_euclid(bin_width_ms) * bin_width_ms
}

/// Returns the start of the bin that closes at `window_end_ms`, i.e. the
/// window `[window_end - width, window_end)` the aggregation engine fills.
pub fn closed_bin_start(window_end_ms: i64, bin_width_ms: i64) -> i64 {
    bin_start(window_end_ms - 1, bin_width_ms)
}

/// Hour-of-day/day-of-week bucket used to condition forecasts on time of
/// week. Monday is day 0 (chrono's `weekday().num_days_from_monday()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBucket {
    pub day_of_week: u8,
    pub hour_of_day: u8,
}

impl TimeBucket {
    /// Computes the bucket for an epoch-millisecond timestamp (UTC).
    pub fn from_timestamp_ms(timestamp_ms: i64) -> Option<Self> {
        let dt: DateTime<Utc> = Utc.timestamp_millis_opt(timestamp_ms).single()?;
        Some(Self {
            day_of_week: dt.weekday().num_days_from_monday() as u8,
            hour_of_day: dt.hour() as u8,
        })
    }
}

/// Minutes elapsed since UTC midnight for a timestamp; used for quiet-hours
/// checks.
pub fn minute_of_day(timestamp_ms: i64) -> Option<i32> {
    let dt: DateTime<Utc> = Utc.timestamp_millis_opt(timestamp_ms).single()?;
    Some((dt.hour() * 60 + dt.minute()) as i32)
}
