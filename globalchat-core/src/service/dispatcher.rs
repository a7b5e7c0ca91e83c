//! Fan-out delivery of one projected payload to every subscribed room
//! except the source.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::{
    config::RelayConfig,
    gateway::{ChatGateway, DeliveryError},
    metrics,
    models::{BroadcastPayload, Subscription, SubscriptionKey},
    repository::SubscriptionStore,
};

/// Sequential, paced fan-out over a registry snapshot.
///
/// Broadcast is fire-and-forget: no return value reports partial failure.
/// Failures surface only through self-healing side effects, structured logs,
/// and metrics counters. Delivery is deliberately sequential with a pause
/// between successful sends as a throughput cap protecting the destination
/// endpoints' own rate limits.
pub struct FanoutDispatcher {
    store: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn ChatGateway>,
    delivery_pause: Duration,
    delivery_timeout: Duration,
}

impl FanoutDispatcher {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn ChatGateway>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            delivery_pause: config.delivery_pause(),
            delivery_timeout: config.delivery_timeout(),
        }
    }

    /// Deliver `payload` to every enabled subscription except `source`.
    ///
    /// The enabled set is snapshotted once at the start: subscriptions added
    /// or removed mid-broadcast are not reflected in this call. The snapshot
    /// avoids holding the registry for the full multi-second fan-out; a room
    /// joining mid-broadcast misses at most this one message.
    pub async fn broadcast(&self, payload: &BroadcastPayload, source: &SubscriptionKey) {
        let subscriptions = match self.store.list_enabled().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(error = %e, "Failed to snapshot subscriptions; dropping broadcast");
                return;
            }
        };

        for subscription in subscriptions {
            // The originating room never receives its own echo.
            if subscription.key() == *source {
                continue;
            }

            match self.gateway.room_exists(&subscription.room_id).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        "Destination room gone; deregistering subscription"
                    );
                    metrics::DELIVERIES.with_label_values(&["room_gone"]).inc();
                    self.heal_by_key(&subscription).await;
                    continue;
                }
                Err(e) => {
                    warn!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        error = %e,
                        "Room resolution failed; keeping subscription"
                    );
                    metrics::DELIVERIES
                        .with_label_values(&["transport_error"])
                        .inc();
                    continue;
                }
            }

            let attempt = timeout(
                self.delivery_timeout,
                self.gateway.deliver(&subscription.endpoint_ref, payload),
            )
            .await;

            match attempt {
                Ok(Ok(())) => {
                    debug!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        "Payload delivered"
                    );
                    metrics::DELIVERIES.with_label_values(&["delivered"]).inc();
                    // Inter-delivery pacing, only after a successful send.
                    sleep(self.delivery_pause).await;
                }
                Ok(Err(DeliveryError::EndpointGone)) => {
                    info!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        "Delivery endpoint gone; deregistering subscription"
                    );
                    metrics::DELIVERIES
                        .with_label_values(&["endpoint_gone"])
                        .inc();
                    self.heal_by_endpoint(&subscription).await;
                }
                Ok(Err(DeliveryError::PermissionDenied)) => {
                    warn!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        "Permission denied on delivery; keeping subscription"
                    );
                    metrics::DELIVERIES
                        .with_label_values(&["permission_denied"])
                        .inc();
                }
                Ok(Err(DeliveryError::Transport(reason))) => {
                    warn!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        reason = %reason,
                        "Transport failure on delivery; keeping subscription"
                    );
                    metrics::DELIVERIES
                        .with_label_values(&["transport_error"])
                        .inc();
                }
                Err(_elapsed) => {
                    warn!(
                        tenant_id = subscription.tenant_id.as_str(),
                        room_id = subscription.room_id.as_str(),
                        timeout_seconds = self.delivery_timeout.as_secs(),
                        "Delivery timed out; keeping subscription"
                    );
                    metrics::DELIVERIES
                        .with_label_values(&["transport_error"])
                        .inc();
                }
            }
        }
    }

    async fn heal_by_key(&self, subscription: &Subscription) {
        match self
            .store
            .remove_by_key(&subscription.tenant_id, &subscription.room_id)
            .await
        {
            Ok(removed) => {
                if removed {
                    metrics::SELF_HEALED.with_label_values(&["room_gone"]).inc();
                }
            }
            Err(e) => {
                // Left for the next failed delivery cycle to heal.
                error!(
                    tenant_id = subscription.tenant_id.as_str(),
                    room_id = subscription.room_id.as_str(),
                    error = %e,
                    "Self-healing delete by key failed"
                );
            }
        }
    }

    async fn heal_by_endpoint(&self, subscription: &Subscription) {
        match self
            .store
            .remove_by_endpoint(&subscription.endpoint_ref)
            .await
        {
            Ok(removed) => {
                if removed {
                    metrics::SELF_HEALED
                        .with_label_values(&["endpoint_gone"])
                        .inc();
                }
            }
            Err(e) => {
                error!(
                    tenant_id = subscription.tenant_id.as_str(),
                    room_id = subscription.room_id.as_str(),
                    error = %e,
                    "Self-healing delete by endpoint failed"
                );
            }
        }
    }
}
