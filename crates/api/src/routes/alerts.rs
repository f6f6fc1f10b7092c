//! Alert subscription endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::alert_subscription::{AlertResponse, CreateAlertRequest, ListAlertsResponse};
use persistence::repositories::{AlertSubscriptionRepository, DeviceRepository};

/// Create an alert subscription.
///
/// POST /api/v1/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<AlertResponse>), ApiError> {
    request.validate()?;
    if request.has_partial_quiet_hours() {
        return Err(ApiError::Validation(
            "Quiet hours require both quietStartMinute and quietEndMinute".to_string(),
        ));
    }

    // The device must exist; a subscription on an unknown device would
    // never fire.
    DeviceRepository::new(state.pool.clone())
        .find_by_device_id(request.device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))?;

    let expires_at = Utc::now() + Duration::minutes(request.ttl_minutes);
    let repo = AlertSubscriptionRepository::new(state.pool.clone());
    let entity = repo
        .create(
            request.user_id,
            request.device_id,
            request.quiet_start_minute,
            request.quiet_end_minute,
            expires_at,
        )
        .await?;

    let subscription = entity.into_domain();
    info!(
        alert_id = %subscription.alert_id,
        user_id = %subscription.user_id,
        device_id = %subscription.device_id,
        ttl_minutes = request.ttl_minutes,
        "Alert subscription created"
    );

    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// Query parameters for listing alerts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListAlertsQuery {
    pub user_id: Uuid,
    /// Include fired/cancelled/expired subscriptions (default false).
    #[serde(default)]
    pub include_terminal: bool,
}

/// List a user's alert subscriptions, newest first.
///
/// GET /api/v1/alerts?user_id=&include_terminal=
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<ListAlertsResponse>, ApiError> {
    let repo = AlertSubscriptionRepository::new(state.pool.clone());
    let entities = repo
        .list_by_user(query.user_id, query.include_terminal)
        .await?;

    let alerts: Vec<AlertResponse> = entities
        .into_iter()
        .map(|e| e.into_domain().into())
        .collect();

    Ok(Json(ListAlertsResponse {
        total: alerts.len(),
        alerts,
    }))
}

/// Cancel an active alert subscription.
///
/// DELETE /api/v1/alerts/:alert_id
///
/// Cancelling an already-terminal subscription is a conflict, not a
/// transition; terminal states absorb.
pub async fn cancel_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<AlertResponse>, ApiError> {
    let repo = AlertSubscriptionRepository::new(state.pool.clone());

    match repo.cancel(alert_id).await? {
        Some(entity) => {
            info!(alert_id = %alert_id, "Alert subscription cancelled");
            Ok(Json(entity.into_domain().into()))
        }
        None => match repo.find_by_alert_id(alert_id).await? {
            Some(existing) => Err(ApiError::Conflict(format!(
                "Alert is already {}",
                existing.into_domain().status
            ))),
            None => Err(ApiError::NotFound("Alert not found".to_string())),
        },
    }
}
