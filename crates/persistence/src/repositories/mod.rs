//! Repository implementations for database operations.

pub mod aggregate_bin;
pub mod alert_subscription;
pub mod device;
pub mod device_state;
pub mod transition_event;

pub use aggregate_bin::AggregateBinRepository;
pub use alert_subscription::AlertSubscriptionRepository;
pub use device::DeviceRepository;
pub use device_state::{DeviceStateRepository, TransitionInput};
pub use transition_event::{HistoryQuery, PreBinStatus, TransitionEventRepository};
