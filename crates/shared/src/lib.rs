//! Shared utilities and common types for the equipment occupancy backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Common validation logic
//! - Time-bin arithmetic for aggregation and forecasting
//! - Device status topic parsing

pub mod timebin;
pub mod topic;
pub mod validation;
