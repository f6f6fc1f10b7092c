//! Device endpoint handlers: provisioning, current state, transition
//! history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::device::{DeviceResponse, RegisterDeviceRequest};
use domain::models::state_record::{SiteStateResponse, StateRecordResponse};
use domain::models::status_event::{
    GetHistoryResponse, HistoryPagination, TransitionEventResponse,
};
use domain::models::EquipmentStatus;
use persistence::entities::DeviceStateEntity;
use persistence::repositories::{
    DeviceRepository, DeviceStateRepository, HistoryQuery, TransitionEventRepository,
};

/// Register a device (provisioning surface).
///
/// POST /api/v1/devices/register
pub async fn register_device(
    State(state): State<AppState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError> {
    request.validate()?;

    let repo = DeviceRepository::new(state.pool.clone());
    let entity = repo
        .register(
            request.device_id,
            &request.site_id,
            &request.category,
            request.latitude,
            request.longitude,
        )
        .await?;

    info!(
        device_id = %request.device_id,
        site_id = %request.site_id,
        category = %request.category,
        "Device registered"
    );

    Ok((StatusCode::OK, Json(entity.into_domain().into())))
}

fn state_response(entity: DeviceStateEntity) -> StateRecordResponse {
    let updated_at = entity.updated_at;
    let record = entity.into_domain();
    StateRecordResponse {
        device_id: record.device_id,
        site_id: record.site_id,
        category: record.category,
        status: record.status,
        last_update: record.last_update,
        last_change: record.last_change,
        updated_at,
    }
}

/// Get the current state record for a device.
///
/// GET /api/v1/devices/:device_id/state
pub async fn get_device_state(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> Result<Json<StateRecordResponse>, ApiError> {
    let repo = DeviceStateRepository::new(state.pool.clone());
    let entity = repo
        .find_by_device_id(device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device has no recorded state".to_string()))?;

    Ok(Json(state_response(entity)))
}

/// Query parameters for site state listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SiteStateQuery {
    pub category: Option<String>,
}

/// List current state for every device at a site.
///
/// GET /api/v1/sites/:site_id/state?category=
pub async fn get_site_state(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Query(query): Query<SiteStateQuery>,
) -> Result<Json<SiteStateResponse>, ApiError> {
    shared::validation::validate_site_id(&site_id)
        .map_err(|_| ApiError::Validation("Invalid site ID".to_string()))?;

    let repo = DeviceStateRepository::new(state.pool.clone());
    let entities = repo
        .list_by_site(&site_id, query.category.as_deref())
        .await?;

    let devices: Vec<StateRecordResponse> = entities.into_iter().map(state_response).collect();
    let free_count = devices
        .iter()
        .filter(|d| d.status == EquipmentStatus::Free)
        .count();

    Ok(Json(SiteStateResponse {
        site_id,
        total: devices.len(),
        free_count,
        devices,
    }))
}

/// Query parameters for GET /api/v1/devices/:device_id/history
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GetHistoryQuery {
    /// Pagination cursor (format: "timestamp_id")
    pub cursor: Option<String>,
    /// Number of results (1-100, default 50)
    #[serde(default = "default_limit")]
    pub limit: i32,
    /// Start timestamp filter, inclusive (milliseconds)
    pub from: Option<i64>,
    /// End timestamp filter, exclusive (milliseconds)
    pub to: Option<i64>,
}

fn default_limit() -> i32 {
    50
}

/// Parses a "timestamp_id" cursor into its parts.
fn parse_cursor(cursor: &str) -> Option<(i64, Uuid)> {
    let (timestamp, id) = cursor.split_once('_')?;
    Some((timestamp.parse().ok()?, Uuid::parse_str(id).ok()?))
}

/// Get the transition history for a device, newest first.
///
/// GET /api/v1/devices/:device_id/history?from=&to=&limit=&cursor=
pub async fn get_device_history(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(query): Query<GetHistoryQuery>,
) -> Result<Json<GetHistoryResponse>, ApiError> {
    if !(1..=100).contains(&query.limit) {
        return Err(ApiError::Validation(
            "limit must be between 1 and 100".to_string(),
        ));
    }

    let (cursor_timestamp, cursor_id) = match &query.cursor {
        Some(cursor) => {
            let (timestamp, id) = parse_cursor(cursor)
                .ok_or_else(|| ApiError::Validation("Invalid cursor".to_string()))?;
            (Some(timestamp), Some(id))
        }
        None => (None, None),
    };

    let repo = TransitionEventRepository::new(state.pool.clone());
    let (entities, has_more) = repo
        .history_by_device(HistoryQuery {
            device_id,
            cursor_timestamp,
            cursor_id,
            from_timestamp: query.from,
            to_timestamp: query.to,
            limit: query.limit,
        })
        .await?;

    let events: Vec<TransitionEventResponse> = entities
        .into_iter()
        .map(|e| e.into_domain().into())
        .collect();

    let next_cursor = if has_more {
        events
            .last()
            .map(|e| format!("{}_{}", e.timestamp, e.id))
    } else {
        None
    };

    Ok(Json(GetHistoryResponse {
        events,
        pagination: HistoryPagination {
            next_cursor,
            has_more,
        },
    }))
}
