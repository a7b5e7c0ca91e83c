//! Prometheus metrics for relay observability.
//!
//! Broadcast is fire-and-forget by design, so these counters (plus logging)
//! are the only way fan-out outcomes are observable from the outside.

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry, Counter, CounterVec,
    Encoder, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: std::sync::LazyLock<Registry> = std::sync::LazyLock::new(Registry::new);

/// Messages accepted for relay (passed admission and projection)
pub static MESSAGES_RELAYED: std::sync::LazyLock<Counter> = std::sync::LazyLock::new(|| {
    register_counter_with_registry!(
        "relay_messages_total",
        "Total number of messages accepted for relay",
        REGISTRY.clone()
    )
    .expect("Failed to register MESSAGES_RELAYED")
});

/// Triggers dropped by the per-tenant cooldown gate
pub static COOLDOWN_SUPPRESSED: std::sync::LazyLock<Counter> = std::sync::LazyLock::new(|| {
    register_counter_with_registry!(
        "relay_cooldown_suppressed_total",
        "Total number of triggers suppressed by the cooldown gate",
        REGISTRY.clone()
    )
    .expect("Failed to register COOLDOWN_SUPPRESSED")
});

/// Individual delivery attempts, by outcome:
/// delivered, endpoint_gone, room_gone, permission_denied, transport_error
pub static DELIVERIES: std::sync::LazyLock<CounterVec> = std::sync::LazyLock::new(|| {
    register_counter_vec_with_registry!(
        "relay_deliveries_total",
        "Total number of delivery attempts by outcome",
        &["outcome"],
        REGISTRY.clone()
    )
    .expect("Failed to register DELIVERIES")
});

/// Subscriptions removed by self-healing, by trigger (room_gone, endpoint_gone)
pub static SELF_HEALED: std::sync::LazyLock<CounterVec> = std::sync::LazyLock::new(|| {
    register_counter_vec_with_registry!(
        "relay_self_healed_total",
        "Total number of subscriptions deregistered by self-healing",
        &["trigger"],
        REGISTRY.clone()
    )
    .expect("Failed to register SELF_HEALED")
});

/// Encode all registered metrics in Prometheus text format.
pub fn encode() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
