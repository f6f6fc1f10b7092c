//! Persistence layer for the equipment occupancy backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the timestamp-fenced
//!   current-state writes the ingest pipeline depends on

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
