//! Join/leave handling: two-phase endpoint + registry operations with
//! compensating rollback on partial failure.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    gateway::{ChatGateway, ProvisionError},
    models::{RoomId, Subscription, TenantId},
    repository::SubscriptionStore,
};

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("could not provision delivery endpoint: {0}")]
    Provision(#[from] ProvisionError),

    #[error("could not persist subscription: {0}")]
    Store(#[source] crate::Error),
}

#[derive(Error, Debug)]
pub enum LeaveError {
    #[error("this room is not subscribed to the relay")]
    NotSubscribed,

    #[error("could not remove subscription: {0}")]
    Store(#[source] crate::Error),
}

/// Drives the per-room state machine `Unsubscribed -> Subscribed ->
/// Unsubscribed`. The two-phase sequences are best-effort, not transactional:
/// a crash between sub-steps can orphan an endpoint (acceptable) but never a
/// registry row pointing at a missing endpoint beyond the next failed
/// delivery, which self-heals it.
pub struct LifecycleManager {
    store: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn ChatGateway>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn SubscriptionStore>, gateway: Arc<dyn ChatGateway>) -> Self {
        Self { store, gateway }
    }

    /// Subscribe a room to the relay network.
    ///
    /// Provisions a fresh delivery endpoint first; if that fails the registry
    /// is untouched. If the registry write fails afterwards, the endpoint is
    /// torn down as a compensating action (teardown failure is logged and
    /// left as an orphan, never retried).
    ///
    /// Upsert semantics: re-joining a room that is already subscribed rotates
    /// its endpoint instead of failing.
    pub async fn join(
        &self,
        tenant_id: TenantId,
        room_id: RoomId,
    ) -> Result<Subscription, JoinError> {
        let endpoint = self
            .gateway
            .provision_endpoint(&tenant_id, &room_id)
            .await?;

        let subscription = Subscription::new(tenant_id, room_id, endpoint);

        if let Err(e) = self.store.upsert(&subscription).await {
            if let Err(teardown) = self
                .gateway
                .destroy_endpoint(&subscription.endpoint_ref)
                .await
            {
                error!(
                    tenant_id = subscription.tenant_id.as_str(),
                    room_id = subscription.room_id.as_str(),
                    error = %teardown,
                    "Compensating endpoint teardown failed; endpoint orphaned"
                );
            }
            return Err(JoinError::Store(e));
        }

        info!(
            tenant_id = subscription.tenant_id.as_str(),
            room_id = subscription.room_id.as_str(),
            "Room joined the relay network"
        );

        Ok(subscription)
    }

    /// Unsubscribe a room from the relay network.
    ///
    /// Deletes the registry row first, then destroys the endpoint
    /// best-effort: endpoint-already-gone is success, any other teardown
    /// failure is logged and ignored.
    pub async fn leave(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<(), LeaveError> {
        let subscription = self
            .store
            .get(tenant_id, room_id)
            .await
            .map_err(LeaveError::Store)?
            .ok_or(LeaveError::NotSubscribed)?;

        let deleted = self
            .store
            .remove_by_key(tenant_id, room_id)
            .await
            .map_err(LeaveError::Store)?;
        if !deleted {
            // Raced with a self-healing delete; same end state.
            return Err(LeaveError::NotSubscribed);
        }

        if let Err(e) = self
            .gateway
            .destroy_endpoint(&subscription.endpoint_ref)
            .await
        {
            warn!(
                tenant_id = tenant_id.as_str(),
                room_id = room_id.as_str(),
                error = %e,
                "Endpoint teardown failed during leave; endpoint orphaned"
            );
        }

        info!(
            tenant_id = tenant_id.as_str(),
            room_id = room_id.as_str(),
            "Room left the relay network"
        );

        Ok(())
    }
}
