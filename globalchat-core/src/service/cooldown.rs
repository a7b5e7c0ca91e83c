//! Per-tenant admission control for relay triggers.

use std::time::Duration;

use dashmap::{mapref::entry::Entry, DashMap};
use tokio::time::Instant;

use crate::models::TenantId;

/// Cooldown gate suppressing relay triggers for a fixed window after a
/// tenant's last accepted trigger.
///
/// Process-wide and in-memory: state resets on restart, which is acceptable
/// because a restart makes all in-flight cooldowns moot. The budget is per
/// tenant, so multiple rooms of one tenant share a single window.
///
/// The check and the timestamp write happen under the map entry for that
/// tenant, so two concurrent acquires for the same tenant can never both
/// succeed within one window. The timestamp is recorded at acceptance, before
/// fan-out begins, so overlapping triggers during a slow fan-out are still
/// suppressed.
pub struct CooldownGate {
    window: Duration,
    last_relay: DashMap<TenantId, Instant>,
}

impl CooldownGate {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_relay: DashMap::new(),
        }
    }

    /// Try to admit a relay trigger for the tenant. Returns `true` and
    /// records acceptance if the window has elapsed (or the tenant was never
    /// seen); returns `false` with no side effects otherwise.
    pub fn try_acquire(&self, tenant_id: &TenantId) -> bool {
        self.try_acquire_at(tenant_id, Instant::now())
    }

    fn try_acquire_at(&self, tenant_id: &TenantId, now: Instant) -> bool {
        match self.last_relay.entry(tenant_id.clone()) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) >= self.window {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_trigger_is_accepted() {
        let gate = CooldownGate::new(Duration::from_secs(10));
        assert!(gate.try_acquire(&TenantId::from("t1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_suppresses_then_readmits() {
        let gate = CooldownGate::new(Duration::from_secs(10));
        let tenant = TenantId::from("t1");

        // t=0 accepted, t=5 rejected, t=11 accepted
        assert!(gate.try_acquire(&tenant));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!gate.try_acquire(&tenant));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(gate.try_acquire(&tenant));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_has_no_side_effects() {
        let gate = CooldownGate::new(Duration::from_secs(10));
        let tenant = TenantId::from("t1");

        assert!(gate.try_acquire(&tenant));
        tokio::time::advance(Duration::from_secs(9)).await;
        // The rejection at t=9 must not push the window out
        assert!(!gate.try_acquire(&tenant));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(gate.try_acquire(&tenant));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tenants_have_independent_budgets() {
        let gate = CooldownGate::new(Duration::from_secs(10));
        assert!(gate.try_acquire(&TenantId::from("t1")));
        assert!(gate.try_acquire(&TenantId::from("t2")));
        assert!(!gate.try_acquire(&TenantId::from("t1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundary_exactly_window_elapsed() {
        let gate = CooldownGate::new(Duration::from_secs(10));
        let tenant = TenantId::from("t1");

        assert!(gate.try_acquire(&tenant));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(gate.try_acquire(&tenant));
    }
}
