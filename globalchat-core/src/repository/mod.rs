//! Subscription registry: the only durable state in the relay.
//!
//! The original system shipped two functionally equivalent persistence
//! layers; they collapse here into one `SubscriptionStore` contract with a
//! Postgres backend for deployment and a `DashMap` backend for embedding and
//! tests.

pub mod memory;
pub mod subscription;

pub use memory::MemorySubscriptionStore;
pub use subscription::PgSubscriptionRepository;

use async_trait::async_trait;

use crate::{
    models::{EndpointRef, RoomId, Subscription, TenantId},
    Result,
};

/// Durable mapping from `(tenant, room)` to a delivery endpoint.
///
/// Every mutation is either an upsert or a delete keyed by natural key or
/// endpoint, so concurrent callers need no external locking: any interleaving
/// of self-healing deletes and upserts converges.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert or replace by `(tenant_id, room_id)`. Replacing an existing row
    /// rotates its endpoint (re-join support).
    async fn upsert(&self, subscription: &Subscription) -> Result<()>;

    /// Point lookup by natural key.
    async fn get(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<Option<Subscription>>;

    /// Delete by natural key. Idempotent; returns whether a row was deleted.
    async fn remove_by_key(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<bool>;

    /// Delete whichever row owns the given endpoint. Used by self-healing
    /// when the endpoint is known to be dead.
    async fn remove_by_endpoint(&self, endpoint: &EndpointRef) -> Result<bool>;

    /// All enabled subscriptions. No ordering guarantee.
    async fn list_enabled(&self) -> Result<Vec<Subscription>>;

    /// Flip the soft-disable flag. Returns whether a row was updated.
    async fn set_enabled(&self, tenant_id: &TenantId, room_id: &RoomId, enabled: bool)
        -> Result<bool>;
}
