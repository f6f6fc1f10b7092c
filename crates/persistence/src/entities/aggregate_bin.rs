//! Aggregate bin entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::aggregate_bin::AggregateBin;

/// Database row mapping for the aggregate_bins table.
///
/// `occupancy_ratio` is stored for ad-hoc SQL inspection but the domain
/// model always recomputes it from the counts.
#[derive(Debug, Clone, FromRow)]
pub struct AggregateBinEntity {
    pub site_id: String,
    pub category: String,
    pub bin_start: i64,
    pub bin_width: i64,
    pub free_count: i64,
    pub total_count: i64,
    pub occupancy_ratio: f64,
    pub updated_at: DateTime<Utc>,
}

impl AggregateBinEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> AggregateBin {
        AggregateBin {
            site_id: self.site_id,
            category: self.category,
            bin_start: self.bin_start,
            bin_width: self.bin_width,
            free_count: self.free_count,
            total_count: self.total_count,
        }
    }
}
