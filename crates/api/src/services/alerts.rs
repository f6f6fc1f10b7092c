//! Alert matching: consumes transition notifications and fires
//! subscriptions.
//!
//! Firing is a compare-and-set on the subscription status, so two racing
//! transitions for the same device produce exactly one notification per
//! subscription. Quiet hours suppress delivery without consuming the
//! subscription. A subscription that wins the CAS is terminal even if the
//! push delivery afterwards fails; the user can observe the `fired` state
//! through the list endpoint.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::middleware::metrics::{record_alert_fired, record_alert_suppressed};
use crate::services::fanout::FanoutHub;
use domain::models::alert_subscription::{AlertFiredNotification, AlertSubscription};
use domain::models::device::EquipmentStatus;
use domain::models::status_event::Transition;
use persistence::repositories::AlertSubscriptionRepository;

/// Matches transitions against active subscriptions.
pub struct AlertService {
    subscriptions: AlertSubscriptionRepository,
    hub: Arc<FanoutHub>,
}

/// Whether delivery for this subscription is suppressed at `minute_of_day`.
fn is_suppressed(subscription: &AlertSubscription, minute_of_day: Option<i32>) -> bool {
    match (subscription.quiet_hours, minute_of_day) {
        (Some(quiet), Some(minute)) => quiet.contains(minute),
        _ => false,
    }
}

/// A subscription past its deadline must not fire, even if the expiry
/// sweep has not reached it yet. The fire CAS re-checks this in SQL; this
/// check just skips the round trip.
fn is_expired(subscription: &AlertSubscription, now: DateTime<Utc>) -> bool {
    subscription.expires_at <= now
}

impl AlertService {
    pub fn new(pool: PgPool, hub: Arc<FanoutHub>) -> Self {
        Self {
            subscriptions: AlertSubscriptionRepository::new(pool),
            hub,
        }
    }

    /// Consumes one transition notification. Only freeing transitions are
    /// relevant. Errors degrade this one evaluation; they never propagate
    /// back into the ingest path.
    pub async fn on_transition(&self, transition: &Transition) {
        if transition.to_status != EquipmentStatus::Free {
            return;
        }

        let rows = match self
            .subscriptions
            .find_active_by_device(transition.device_id)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    device_id = %transition.device_id,
                    error = %e,
                    "Failed to load subscriptions for transition"
                );
                return;
            }
        };

        // Suppression and expiry are evaluated at delivery time, not
        // event time
        let now = Utc::now();
        let minute = shared::timebin::minute_of_day(now.timestamp_millis());

        for row in rows {
            let subscription = row.into_domain();
            if is_expired(&subscription, now) {
                debug!(
                    alert_id = %subscription.alert_id,
                    "Subscription past deadline; leaving it for the expiry sweep"
                );
                continue;
            }
            if is_suppressed(&subscription, minute) {
                record_alert_suppressed();
                debug!(
                    alert_id = %subscription.alert_id,
                    "Alert delivery suppressed by quiet hours"
                );
                continue;
            }
            self.fire(subscription.alert_id, transition).await;
        }
    }

    async fn fire(&self, alert_id: Uuid, transition: &Transition) {
        match self.subscriptions.fire(alert_id).await {
            Ok(Some(row)) => {
                let fired = row.into_domain();
                record_alert_fired();
                info!(
                    alert_id = %fired.alert_id,
                    user_id = %fired.user_id,
                    device_id = %fired.device_id,
                    "Alert fired"
                );

                let notification = AlertFiredNotification {
                    alert_id: fired.alert_id,
                    user_id: fired.user_id,
                    device_id: fired.device_id,
                    site_id: transition.site_id.clone(),
                    category: transition.category.clone(),
                    freed_at: transition.timestamp,
                };
                self.hub.notify_user(fired.user_id, &notification).await;
            }
            // Lost the CAS: another transition fired it first, or it was
            // cancelled/expired meanwhile.
            Ok(None) => {}
            Err(e) => {
                warn!(alert_id = %alert_id, error = %e, "Failed to fire alert");
            }
        }
    }
}
