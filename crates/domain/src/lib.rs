//! Domain layer for the equipment occupancy backend.
//!
//! This crate contains:
//! - Domain models (Device, StateRecord, TransitionEvent, AggregateBin,
//!   AlertSubscription, ForecastResult)
//! - Pure business services (ingest classification, window aggregation,
//!   availability forecasting)

pub mod models;
pub mod services;
