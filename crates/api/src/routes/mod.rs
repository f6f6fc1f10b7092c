//! HTTP and WebSocket route handlers.

pub mod alerts;
pub mod devices;
pub mod forecasts;
pub mod health;
pub mod live;
pub mod occupancy;
pub mod status_events;
