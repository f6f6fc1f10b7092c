//! Domain models.

pub mod aggregate_bin;
pub mod alert_subscription;
pub mod device;
pub mod forecast;
pub mod state_record;
pub mod status_event;

pub use aggregate_bin::AggregateBin;
pub use alert_subscription::{AlertStatus, AlertSubscription, QuietHours};
pub use device::{Device, EquipmentStatus};
pub use forecast::{ForecastClassification, ForecastResult};
pub use state_record::StateRecord;
pub use status_event::{RawStatusEvent, Transition, TransitionEvent};
