use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EndpointRef, RoomId, TenantId};

/// Natural key of a subscription: one room of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub tenant_id: TenantId,
    pub room_id: RoomId,
}

impl SubscriptionKey {
    #[must_use]
    pub const fn new(tenant_id: TenantId, room_id: RoomId) -> Self {
        Self { tenant_id, room_id }
    }
}

impl std::fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.room_id)
    }
}

/// One room's participation in the relay network.
///
/// The endpoint ref is owned exclusively by this subscription; no two
/// subscriptions ever share an endpoint handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub tenant_id: TenantId,
    pub room_id: RoomId,
    pub endpoint_ref: EndpointRef,
    /// Soft-disable flag: disabled rows are excluded from fan-out but
    /// retained for audit/restore.
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(tenant_id: TenantId, room_id: RoomId, endpoint_ref: EndpointRef) -> Self {
        Self {
            tenant_id,
            room_id,
            endpoint_ref,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(self.tenant_id.clone(), self.room_id.clone())
    }
}
