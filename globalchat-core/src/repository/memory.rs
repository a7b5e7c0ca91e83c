use async_trait::async_trait;
use dashmap::DashMap;

use super::SubscriptionStore;
use crate::{
    models::{EndpointRef, RoomId, Subscription, SubscriptionKey, TenantId},
    Result,
};

/// In-memory subscription registry.
///
/// Same contract as the Postgres backend, keyed by the natural key. Suitable
/// for single-process embedding and for tests; state is lost on restart.
#[derive(Clone, Default)]
pub struct MemorySubscriptionStore {
    rows: std::sync::Arc<DashMap<SubscriptionKey, Subscription>>,
}

impl MemorySubscriptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<()> {
        self.rows.insert(subscription.key(), subscription.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<Option<Subscription>> {
        let key = SubscriptionKey::new(tenant_id.clone(), room_id.clone());
        Ok(self.rows.get(&key).map(|entry| entry.value().clone()))
    }

    async fn remove_by_key(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<bool> {
        let key = SubscriptionKey::new(tenant_id.clone(), room_id.clone());
        Ok(self.rows.remove(&key).is_some())
    }

    async fn remove_by_endpoint(&self, endpoint: &EndpointRef) -> Result<bool> {
        let key = self
            .rows
            .iter()
            .find(|entry| entry.value().endpoint_ref == *endpoint)
            .map(|entry| entry.key().clone());

        match key {
            Some(key) => Ok(self.rows.remove(&key).is_some()),
            None => Ok(false),
        }
    }

    async fn list_enabled(&self) -> Result<Vec<Subscription>> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.value().enabled)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn set_enabled(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
        enabled: bool,
    ) -> Result<bool> {
        let key = SubscriptionKey::new(tenant_id.clone(), room_id.clone());
        match self.rows.get_mut(&key) {
            Some(mut entry) => {
                entry.value_mut().enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
