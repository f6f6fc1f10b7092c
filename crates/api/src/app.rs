use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{alerts, devices, forecasts, health, live, occupancy, status_events};
use crate::services::{AlertService, FanoutHub, IngestService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub hub: Arc<FanoutHub>,
    pub ingest: Arc<IngestService>,
}

/// Wires the shared services together. The alert service consumes the same
/// hub the WebSocket routes subscribe through, so alert firings reach the
/// owning user's live connections.
pub fn build_state(config: Config, pool: PgPool) -> AppState {
    let config = Arc::new(config);
    let hub = Arc::new(FanoutHub::new());
    let alerts = Arc::new(AlertService::new(pool.clone(), Arc::clone(&hub)));
    let ingest = Arc::new(IngestService::new(
        pool.clone(),
        Arc::clone(&hub),
        alerts,
    ));

    AppState {
        pool,
        config,
        hub,
        ingest,
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Versioned API routes
    let api_routes = Router::new()
        // Ingest intake
        .route("/api/v1/status-events", post(status_events::ingest_status_event))
        // Device provisioning and state queries
        .route("/api/v1/devices/register", post(devices::register_device))
        .route("/api/v1/devices/:device_id/state", get(devices::get_device_state))
        .route(
            "/api/v1/devices/:device_id/history",
            get(devices::get_device_history),
        )
        .route(
            "/api/v1/devices/:device_id/forecast",
            get(forecasts::get_device_forecast),
        )
        // Site-level queries
        .route("/api/v1/sites/:site_id/state", get(devices::get_site_state))
        .route(
            "/api/v1/sites/:site_id/occupancy",
            get(occupancy::get_site_occupancy),
        )
        // Alert subscriptions
        .route("/api/v1/alerts", post(alerts::create_alert))
        .route("/api/v1/alerts", get(alerts::list_alerts))
        .route("/api/v1/alerts/:alert_id", delete(alerts::cancel_alert))
        // Live push channel
        .route(
            "/api/v1/live/:site_id/:category",
            get(live::live_updates),
        );

    // Public operational routes
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Global middleware (order matters: bottom layers run first)
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
