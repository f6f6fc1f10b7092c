//! Occupancy aggregate bin domain model.

use serde::{Deserialize, Serialize};

/// Occupancy statistics for one `(site, category)` pair over one fixed-width
/// time bin aligned to absolute time.
///
/// `occupancy_ratio` is always recomputed from the counts, never carried
/// incrementally, so replaying a window produces identical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBin {
    pub site_id: String,
    pub category: String,
    /// Bin start in epoch milliseconds.
    pub bin_start: i64,
    /// Bin width in milliseconds.
    pub bin_width: i64,
    /// Devices free for at least half the bin (time-weighted).
    pub free_count: i64,
    /// Distinct devices observed in the bin.
    pub total_count: i64,
}

impl AggregateBin {
    /// Fraction of devices occupied: `1 - free/total`, in `[0, 1]`.
    /// An empty bin reports zero occupancy.
    pub fn occupancy_ratio(&self) -> f64 {
        if self.total_count <= 0 {
            return 0.0;
        }
        let ratio = 1.0 - (self.free_count as f64 / self.total_count as f64);
        ratio.clamp(0.0, 1.0)
    }

    /// Fraction of devices free, in `[0, 1]`.
    pub fn free_ratio(&self) -> f64 {
        if self.total_count <= 0 {
            return 0.0;
        }
        (self.free_count as f64 / self.total_count as f64).clamp(0.0, 1.0)
    }
}

/// Response payload for occupancy queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyBinResponse {
    pub bin_start: i64,
    pub bin_width: i64,
    pub free_count: i64,
    pub total_count: i64,
    pub occupancy_ratio: f64,
}

impl From<AggregateBin> for OccupancyBinResponse {
    fn from(bin: AggregateBin) -> Self {
        let occupancy_ratio = bin.occupancy_ratio();
        Self {
            bin_start: bin.bin_start,
            bin_width: bin.bin_width,
            free_count: bin.free_count,
            total_count: bin.total_count,
            occupancy_ratio,
        }
    }
}

/// Response for listing occupancy bins for a site/category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOccupancyResponse {
    pub site_id: String,
    pub category: String,
    pub bins: Vec<OccupancyBinResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(free: i64, total: i64) -> AggregateBin {
        AggregateBin {
            site_id: "gym-01".to_string(),
            category: "legs".to_string(),
            bin_start: 0,
            bin_width: 900_000,
            free_count: free,
            total_count: total,
        }
    }

    #[test]
    fn test_occupancy_ratio() {
        assert_eq!(bin(1, 2).occupancy_ratio(), 0.5);
        assert_eq!(bin(0, 4).occupancy_ratio(), 1.0);
        assert_eq!(bin(4, 4).occupancy_ratio(), 0.0);
    }

    #[test]
    fn test_occupancy_ratio_empty_bin() {
        assert_eq!(bin(0, 0).occupancy_ratio(), 0.0);
    }

    #[test]
    fn test_occupancy_ratio_in_unit_interval() {
        for (free, total) in [(0, 1), (1, 1), (3, 7), (7, 7), (0, 100)] {
            let r = bin(free, total).occupancy_ratio();
            assert!((0.0..=1.0).contains(&r), "ratio {} out of range", r);
        }
    }

    #[test]
    fn test_free_ratio_complements_occupancy() {
        let b = bin(3, 8);
        assert!((b.free_ratio() + b.occupancy_ratio() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_response_recomputes_ratio() {
        let response: OccupancyBinResponse = bin(1, 2).into();
        assert_eq!(response.occupancy_ratio, 0.5);
        assert_eq!(response.free_count, 1);
        assert_eq!(response.total_count, 2);
    }

    #[test]
    fn test_response_serialization() {
        let response: OccupancyBinResponse = bin(2, 4).into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"occupancyRatio\":0.5"));
        assert!(json.contains("\"binStart\":0"));
    }
}
