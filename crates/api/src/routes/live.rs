//! Live update WebSocket endpoint.
//!
//! Each connection subscribes to one `(site, category)` topic on the
//! fan-out hub and streams push messages until the client disconnects or
//! the hub prunes it. A `user_id` query parameter additionally routes that
//! user's alert firings to the connection.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::FanoutHub;

/// Query parameters for the live channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LiveQuery {
    pub user_id: Option<Uuid>,
}

/// Upgrade to a live update stream for one site/category topic.
///
/// GET /api/v1/live/:site_id/:category?user_id=
pub async fn live_updates(
    State(state): State<AppState>,
    Path((site_id, category)): Path<(String, String)>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    shared::validation::validate_site_id(&site_id)
        .map_err(|_| ApiError::Validation("Invalid site ID".to_string()))?;
    shared::validation::validate_category(&category)
        .map_err(|_| ApiError::Validation("Invalid category".to_string()))?;

    let hub = Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| {
        stream_updates(socket, hub, site_id, category, query.user_id)
    }))
}

async fn stream_updates(
    socket: WebSocket,
    hub: Arc<FanoutHub>,
    site_id: String,
    category: String,
    user_id: Option<Uuid>,
) {
    let (connection_id, mut rx) = hub.subscribe(site_id, category, user_id).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Some(json) => {
                        if sink.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    // Sender side gone: the hub pruned this connection
                    None => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients only ever send pings/pongs; payloads are ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unsubscribe(&connection_id).await;
    debug!(connection_id = %connection_id, "Live update stream ended");
}
