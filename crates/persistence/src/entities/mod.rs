//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod aggregate_bin;
pub mod alert_subscription;
pub mod device;
pub mod device_state;
pub mod transition_event;

pub use aggregate_bin::AggregateBinEntity;
pub use alert_subscription::AlertSubscriptionEntity;
pub use device::DeviceEntity;
pub use device_state::DeviceStateEntity;
pub use transition_event::TransitionEventEntity;
