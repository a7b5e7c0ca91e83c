pub mod id;
pub mod message;
pub mod subscription;

pub use id::{EndpointRef, RoomId, TenantId};
pub use message::{BroadcastPayload, InboundMessage};
pub use subscription::{Subscription, SubscriptionKey};
