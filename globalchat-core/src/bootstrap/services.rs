//! Service initialization and dependency injection

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::{
    gateway::ChatGateway,
    repository::PgSubscriptionRepository,
    service::RelayService,
    Config,
};

/// Wire the Postgres-backed registry and the host's gateway into a relay
/// service. The gateway implementation belongs to the embedding bot; the core
/// only consumes the trait.
pub fn init_relay_service(
    pool: PgPool,
    gateway: Arc<dyn ChatGateway>,
    config: &Config,
) -> RelayService {
    let store = Arc::new(PgSubscriptionRepository::new(pool));

    info!(
        cooldown_window_seconds = config.relay.cooldown_window_seconds,
        delivery_pause_ms = config.relay.delivery_pause_ms,
        "Relay service initialized"
    );

    RelayService::new(store, gateway, &config.relay)
}
