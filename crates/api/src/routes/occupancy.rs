//! Occupancy aggregate query endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::aggregate_bin::{GetOccupancyResponse, OccupancyBinResponse};
use persistence::repositories::AggregateBinRepository;

/// Query parameters for occupancy retrieval.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OccupancyQuery {
    pub category: String,
    /// Range start, inclusive (epoch milliseconds).
    pub from: i64,
    /// Range end, exclusive (epoch milliseconds).
    pub to: i64,
}

/// List aggregate occupancy bins for a site/category over a time range.
///
/// GET /api/v1/sites/:site_id/occupancy?category=&from=&to=
pub async fn get_site_occupancy(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Query(query): Query<OccupancyQuery>,
) -> Result<Json<GetOccupancyResponse>, ApiError> {
    shared::validation::validate_site_id(&site_id)
        .map_err(|_| ApiError::Validation("Invalid site ID".to_string()))?;
    shared::validation::validate_category(&query.category)
        .map_err(|_| ApiError::Validation("Invalid category".to_string()))?;
    if query.from >= query.to {
        return Err(ApiError::Validation(
            "from must be before to".to_string(),
        ));
    }

    let repo = AggregateBinRepository::new(state.pool.clone());
    let entities = repo
        .find_range(&site_id, &query.category, query.from, query.to)
        .await?;

    let bins: Vec<OccupancyBinResponse> = entities
        .into_iter()
        .map(|e| e.into_domain().into())
        .collect();

    Ok(Json(GetOccupancyResponse {
        site_id,
        category: query.category,
        bins,
    }))
}
