//! Status event intake endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::status_event::{IngestResponse, RawStatusEvent};
use shared::topic::parse_status_topic;

/// Query parameters for POST /api/v1/status-events
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestQuery {
    /// Source topic of the message, when forwarded by a bridge
    /// (`org/{siteId}/devices/{deviceId}/status`). Cross-checked against
    /// the payload identity.
    pub topic: Option<String>,
}

/// Ingest a single status event.
///
/// POST /api/v1/status-events
///
/// Stale and duplicate messages return 200 with the corresponding
/// disposition; only malformed input is rejected.
pub async fn ingest_status_event(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
    Json(request): Json<RawStatusEvent>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    if let Some(topic) = &query.topic {
        let parsed = parse_status_topic(topic)
            .map_err(|e| ApiError::Validation(format!("Invalid status topic: {}", e)))?;
        if parsed.device_id != request.device_id || parsed.site_id != request.site_id {
            return Err(ApiError::Validation(
                "Topic identity does not match payload".to_string(),
            ));
        }
    }

    let response = state.ingest.ingest(request).await?;
    Ok((StatusCode::OK, Json(response)))
}
