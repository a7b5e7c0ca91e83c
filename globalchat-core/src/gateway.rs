//! Seam to the hosting chat client.
//!
//! The relay never talks to the chat platform directly; everything it needs
//! (room resolution, endpoint provisioning, one-way delivery) goes through
//! this trait so the core stays platform-agnostic and testable.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BroadcastPayload, EndpointRef, RoomId, TenantId};

/// Transient gateway failure (network, session, etc.). Callers treat this as
/// "unknown" rather than "gone": no self-healing is triggered by it.
#[derive(Error, Debug)]
#[error("Gateway error: {0}")]
pub struct GatewayError(pub String);

/// Classification of a single delivery attempt failure.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The delivery target was deleted out-of-band; the subscription is dead.
    #[error("delivery endpoint no longer exists")]
    EndpointGone,

    /// Administrative condition that may self-resolve; the subscription is kept.
    #[error("permission denied sending through endpoint")]
    PermissionDenied,

    /// Any other transport failure (including timeouts).
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Failure creating or destroying a delivery endpoint.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("insufficient privilege to manage endpoints: {0}")]
    PermissionDenied(String),

    #[error("endpoint provisioning failed: {0}")]
    Transport(String),
}

/// The hosting chat client, reduced to the operations the relay consumes.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Whether the room is still reachable. `Ok(false)` means definitively
    /// gone (deleted or inaccessible); `Err` means the check itself failed.
    async fn room_exists(&self, room_id: &RoomId) -> Result<bool, GatewayError>;

    /// Display name of a tenant, for attribution footers.
    async fn tenant_name(&self, tenant_id: &TenantId) -> Result<Option<String>, GatewayError>;

    /// Push one payload through a delivery endpoint.
    async fn deliver(
        &self,
        endpoint: &EndpointRef,
        payload: &BroadcastPayload,
    ) -> Result<(), DeliveryError>;

    /// Create a fresh delivery endpoint scoped to the given room.
    async fn provision_endpoint(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
    ) -> Result<EndpointRef, ProvisionError>;

    /// Destroy an endpoint. Endpoint-already-gone is success, not an error.
    async fn destroy_endpoint(&self, endpoint: &EndpointRef) -> Result<(), ProvisionError>;
}
