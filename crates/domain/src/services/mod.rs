//! Pure business logic services.
//!
//! Each service here is a function of its inputs with no I/O, so the
//! pipeline's decisions (ingest disposition, bin contents, forecast
//! classification) can be unit-tested without a database or scheduler.

pub mod aggregation;
pub mod forecast;
pub mod ingest;
