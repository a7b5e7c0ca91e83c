//! Projection of an inbound message into the normalized broadcast payload.

use chrono::Utc;
use thiserror::Error;

use crate::models::{BroadcastPayload, InboundMessage, Subscription};

/// Marker appended when a body had to be cut to the platform limit.
pub const TRUNCATION_MARKER: &str = "...";

/// Number of default-avatar variants the platform serves.
const DEFAULT_AVATAR_VARIANTS: u64 = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// Bot-authored messages are never projected (relay-loop guard).
    #[error("refusing to project a bot-authored message")]
    BotAuthor,

    /// The source room has no enabled subscription.
    #[error("source room is not subscribed to the relay")]
    NotSubscribed,
}

/// Pure transformation from inbound message to broadcast payload.
pub struct Projector {
    body_limit: usize,
}

impl Projector {
    #[must_use]
    pub const fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }

    /// Project a message for fan-out.
    ///
    /// `source` is the subscription matching the message's origin room, if
    /// any. The relay service already checks it before invoking projection;
    /// the check here is a defensive double-check.
    pub fn project(
        &self,
        message: &InboundMessage,
        source: Option<&Subscription>,
        source_tenant_name: &str,
    ) -> Result<BroadcastPayload, ProjectError> {
        if message.author_is_bot {
            return Err(ProjectError::BotAuthor);
        }

        let subscribed = source.is_some_and(|sub| {
            sub.enabled && sub.tenant_id == message.tenant_id && sub.room_id == message.room_id
        });
        if !subscribed {
            return Err(ProjectError::NotSubscribed);
        }

        let author_avatar_ref = message
            .author_avatar_ref
            .clone()
            .unwrap_or_else(|| default_avatar_ref(&message.author_id));

        Ok(BroadcastPayload {
            body: truncate_body(&message.body, self.body_limit),
            author_name: format!("{} ({})", message.author_display_name, message.author_id),
            author_avatar_ref,
            source_tenant_name: source_tenant_name.to_string(),
            source_tenant_id: message.tenant_id.clone(),
            source_room_id: message.room_id.clone(),
            timestamp: Utc::now(),
        })
    }
}

/// Cut `body` to at most `limit` characters, ending in the truncation marker
/// when a cut happened. Char-based so a UTF-8 scalar is never split.
fn truncate_body(body: &str, limit: usize) -> String {
    if body.chars().count() <= limit {
        return body.to_string();
    }

    let keep = limit.saturating_sub(TRUNCATION_MARKER.len());
    let mut truncated: String = body.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Deterministic default-avatar reference for authors without a custom
/// avatar. Numeric ids use the platform's own bucketing; anything else falls
/// back to a stable byte fold.
fn default_avatar_ref(author_id: &str) -> String {
    let bucket = author_id.parse::<u64>().map_or_else(
        |_| {
            author_id
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
                % DEFAULT_AVATAR_VARIANTS
        },
        |id| (id >> 22) % DEFAULT_AVATAR_VARIANTS,
    );
    format!("default://avatars/{bucket}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EndpointRef, RoomId, TenantId};

    fn message(body: &str) -> InboundMessage {
        InboundMessage {
            tenant_id: TenantId::from("t1"),
            room_id: RoomId::from("r1"),
            author_id: "42".to_string(),
            author_display_name: "Alice".to_string(),
            author_avatar_ref: Some("https://cdn.example/alice.png".to_string()),
            body: body.to_string(),
            author_is_bot: false,
        }
    }

    fn source_subscription() -> Subscription {
        Subscription::new(
            TenantId::from("t1"),
            RoomId::from("r1"),
            EndpointRef::from("e1"),
        )
    }

    #[test]
    fn test_short_body_is_unchanged() {
        let projector = Projector::new(2048);
        let payload = projector
            .project(&message("hello"), Some(&source_subscription()), "Guild One")
            .unwrap();
        assert_eq!(payload.body, "hello");
        assert_eq!(payload.author_name, "Alice (42)");
        assert_eq!(payload.source_tenant_name, "Guild One");
    }

    #[test]
    fn test_long_body_is_truncated_to_limit_with_marker() {
        let projector = Projector::new(2048);
        let long = "x".repeat(5000);
        let payload = projector
            .project(&message(&long), Some(&source_subscription()), "Guild One")
            .unwrap();
        assert_eq!(payload.body.chars().count(), 2048);
        assert!(payload.body.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_body_exactly_at_limit_is_unchanged() {
        let projector = Projector::new(10);
        let body = "a".repeat(10);
        let payload = projector
            .project(&message(&body), Some(&source_subscription()), "Guild One")
            .unwrap();
        assert_eq!(payload.body, body);
        assert!(!payload.body.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_never_splits_multibyte_chars() {
        let projector = Projector::new(8);
        let body = "héllo wörld, this is löng";
        let payload = projector
            .project(&message(body), Some(&source_subscription()), "Guild One")
            .unwrap();
        assert_eq!(payload.body.chars().count(), 8);
        assert!(payload.body.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_bot_author_is_refused() {
        let projector = Projector::new(2048);
        let mut msg = message("hi");
        msg.author_is_bot = true;
        let err = projector
            .project(&msg, Some(&source_subscription()), "Guild One")
            .unwrap_err();
        assert_eq!(err, ProjectError::BotAuthor);
    }

    #[test]
    fn test_unsubscribed_source_is_refused() {
        let projector = Projector::new(2048);
        let err = projector
            .project(&message("hi"), None, "Guild One")
            .unwrap_err();
        assert_eq!(err, ProjectError::NotSubscribed);
    }

    #[test]
    fn test_disabled_source_is_refused() {
        let projector = Projector::new(2048);
        let mut sub = source_subscription();
        sub.enabled = false;
        let err = projector
            .project(&message("hi"), Some(&sub), "Guild One")
            .unwrap_err();
        assert_eq!(err, ProjectError::NotSubscribed);
    }

    #[test]
    fn test_missing_avatar_gets_deterministic_default() {
        let projector = Projector::new(2048);
        let mut msg = message("hi");
        msg.author_avatar_ref = None;

        let first = projector
            .project(&msg, Some(&source_subscription()), "Guild One")
            .unwrap();
        let second = projector
            .project(&msg, Some(&source_subscription()), "Guild One")
            .unwrap();

        assert!(!first.author_avatar_ref.is_empty());
        assert_eq!(first.author_avatar_ref, second.author_avatar_ref);
        assert!(first.author_avatar_ref.starts_with("default://avatars/"));
    }

    #[test]
    fn test_custom_avatar_is_preserved() {
        let projector = Projector::new(2048);
        let payload = projector
            .project(&message("hi"), Some(&source_subscription()), "Guild One")
            .unwrap();
        assert_eq!(payload.author_avatar_ref, "https://cdn.example/alice.png");
    }
}
