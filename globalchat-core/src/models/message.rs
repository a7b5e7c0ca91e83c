use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{RoomId, TenantId};

/// Inbound message event as delivered by the hosting chat gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub tenant_id: TenantId,
    pub room_id: RoomId,
    pub author_id: String,
    pub author_display_name: String,
    /// The author's custom avatar reference, if they have one set.
    pub author_avatar_ref: Option<String>,
    pub body: String,
    pub author_is_bot: bool,
}

/// Normalized broadcast payload (ephemeral, never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastPayload {
    /// Message body, truncated to the platform display limit.
    pub body: String,
    /// Author attribution: `display_name (author_id)`.
    pub author_name: String,
    /// Always resolved: custom avatar or the deterministic default.
    pub author_avatar_ref: String,
    pub source_tenant_name: String,
    pub source_tenant_id: TenantId,
    pub source_room_id: RoomId,
    pub timestamp: DateTime<Utc>,
}
