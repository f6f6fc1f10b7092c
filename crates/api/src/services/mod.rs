//! Runtime services: ingest orchestration, real-time fan-out, alert
//! matching.

pub mod alerts;
pub mod fanout;
pub mod ingest;

pub use alerts::AlertService;
pub use fanout::{FanoutHub, PushMessage};
pub use ingest::IngestService;
