//! Inbound-message orchestration: admission, projection, fan-out.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::RelayConfig,
    gateway::ChatGateway,
    metrics,
    models::{InboundMessage, RoomId, Subscription, TenantId},
    repository::SubscriptionStore,
    service::{
        CooldownGate, FanoutDispatcher, JoinError, LeaveError, LifecycleManager, ProjectError,
        Projector,
    },
    Result,
};

/// What happened to one inbound message.
///
/// Only `Relayed` warrants a user-visible acknowledgment; everything else is
/// a silent drop by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Accepted and fanned out.
    Relayed,
    /// Authored by a bot identity; ignored to prevent relay loops.
    BotAuthor,
    /// The source room has no enabled subscription.
    NotSubscribed,
    /// Suppressed by the per-tenant cooldown gate.
    RateLimited,
}

/// Long-lived relay service instance.
///
/// Holds the process-wide cooldown state (initialized at service start, never
/// reset except on restart) and wires the registry, gateway, projector,
/// dispatcher, and lifecycle manager together. The embedding bot is expected
/// to run each inbound event in its own task; within one call the fan-out is
/// awaited to completion, matching the acknowledge-after-relay flow.
pub struct RelayService {
    store: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn ChatGateway>,
    cooldown: CooldownGate,
    projector: Projector,
    dispatcher: FanoutDispatcher,
    lifecycle: LifecycleManager,
}

impl RelayService {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn ChatGateway>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            cooldown: CooldownGate::new(config.cooldown_window()),
            projector: Projector::new(config.body_limit),
            dispatcher: FanoutDispatcher::new(Arc::clone(&store), Arc::clone(&gateway), config),
            lifecycle: LifecycleManager::new(Arc::clone(&store), Arc::clone(&gateway)),
            store,
            gateway,
        }
    }

    /// Handle one inbound message from the gateway.
    ///
    /// Errors are returned only for registry I/O failures on the admission
    /// path; fan-out failures never surface here (fire-and-forget).
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<RelayOutcome> {
        if message.author_is_bot {
            return Ok(RelayOutcome::BotAuthor);
        }

        let source = self
            .store
            .get(&message.tenant_id, &message.room_id)
            .await?
            .filter(|sub| sub.enabled);
        let Some(source) = source else {
            return Ok(RelayOutcome::NotSubscribed);
        };

        // Acceptance is recorded before fan-out begins, so overlapping
        // triggers during a slow fan-out stay suppressed.
        if !self.cooldown.try_acquire(&message.tenant_id) {
            metrics::COOLDOWN_SUPPRESSED.inc();
            debug!(
                tenant_id = message.tenant_id.as_str(),
                "Relay trigger suppressed by cooldown"
            );
            return Ok(RelayOutcome::RateLimited);
        }

        let tenant_name = self.resolve_tenant_name(&message.tenant_id).await;

        let payload = match self
            .projector
            .project(&message, Some(&source), &tenant_name)
        {
            Ok(payload) => payload,
            Err(ProjectError::BotAuthor) => return Ok(RelayOutcome::BotAuthor),
            Err(ProjectError::NotSubscribed) => return Ok(RelayOutcome::NotSubscribed),
        };

        metrics::MESSAGES_RELAYED.inc();
        self.dispatcher.broadcast(&payload, &source.key()).await;

        Ok(RelayOutcome::Relayed)
    }

    /// Attribution is best-effort: fall back to the raw tenant id when the
    /// gateway cannot produce a display name.
    async fn resolve_tenant_name(&self, tenant_id: &TenantId) -> String {
        match self.gateway.tenant_name(tenant_id).await {
            Ok(Some(name)) => name,
            Ok(None) => tenant_id.to_string(),
            Err(e) => {
                warn!(
                    tenant_id = tenant_id.as_str(),
                    error = %e,
                    "Tenant name lookup failed; using id for attribution"
                );
                tenant_id.to_string()
            }
        }
    }

    /// Subscribe a room. Exposed to the administration/command layer.
    pub async fn join(
        &self,
        tenant_id: TenantId,
        room_id: RoomId,
    ) -> std::result::Result<Subscription, JoinError> {
        self.lifecycle.join(tenant_id, room_id).await
    }

    /// Unsubscribe a room. Exposed to the administration/command layer.
    pub async fn leave(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
    ) -> std::result::Result<(), LeaveError> {
        self.lifecycle.leave(tenant_id, room_id).await
    }
}
