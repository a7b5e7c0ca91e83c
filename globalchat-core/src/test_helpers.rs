//! Test fixtures and scripted collaborators shared across unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    gateway::{ChatGateway, DeliveryError, GatewayError, ProvisionError},
    models::{BroadcastPayload, EndpointRef, InboundMessage, RoomId, Subscription, TenantId},
    repository::{MemorySubscriptionStore, SubscriptionStore},
    Error, Result,
};

/// Build an inbound message fixture.
pub fn test_message(tenant: &str, room: &str, author: &str, body: &str) -> InboundMessage {
    InboundMessage {
        tenant_id: TenantId::from(tenant),
        room_id: RoomId::from(room),
        author_id: "1".to_string(),
        author_display_name: author.to_string(),
        author_avatar_ref: None,
        body: body.to_string(),
        author_is_bot: false,
    }
}

/// Build a broadcast payload fixture.
pub fn test_payload(body: &str, author_name: &str, tenant: &str, room: &str) -> BroadcastPayload {
    BroadcastPayload {
        body: body.to_string(),
        author_name: author_name.to_string(),
        author_avatar_ref: "default://avatars/0".to_string(),
        source_tenant_name: tenant.to_string(),
        source_tenant_id: TenantId::from(tenant),
        source_room_id: RoomId::from(room),
        timestamp: Utc::now(),
    }
}

/// Scripted behavior for one endpoint's deliveries.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedDelivery {
    EndpointGone,
    PermissionDenied,
    Transport,
    /// Never completes; exercises the delivery timeout.
    Hang,
}

/// Scripted chat gateway recording every interaction.
///
/// Rooms exist and deliveries succeed unless told otherwise. Provisioned
/// endpoints are minted as `endpoint-1`, `endpoint-2`, ...
#[derive(Default)]
pub struct MockGateway {
    delivered: Mutex<Vec<(EndpointRef, BroadcastPayload)>>,
    scripted: Mutex<HashMap<String, ScriptedDelivery>>,
    missing_rooms: Mutex<HashSet<String>>,
    unreachable_rooms: Mutex<HashSet<String>>,
    tenant_names: Mutex<HashMap<String, String>>,
    known_endpoints: Mutex<HashSet<String>>,
    destroyed: Mutex<Vec<EndpointRef>>,
    provisioned: Mutex<Vec<EndpointRef>>,
    provision_counter: AtomicUsize,
    provision_fails: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_delivery(&self, endpoint: &str, behavior: ScriptedDelivery) {
        self.scripted
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), behavior);
    }

    /// Simulate the room being deleted: resolution reports it gone.
    pub fn remove_room(&self, room: &str) {
        self.missing_rooms.lock().unwrap().insert(room.to_string());
    }

    /// Simulate a transient failure of the room-resolution call itself.
    pub fn make_room_unreachable(&self, room: &str) {
        self.unreachable_rooms
            .lock()
            .unwrap()
            .insert(room.to_string());
    }

    pub fn set_tenant_name(&self, tenant: &str, name: &str) {
        self.tenant_names
            .lock()
            .unwrap()
            .insert(tenant.to_string(), name.to_string());
    }

    pub fn fail_provisioning(&self) {
        self.provision_fails.store(true, Ordering::SeqCst);
    }

    /// Simulate an out-of-band endpoint deletion.
    pub fn forget_endpoint(&self, endpoint: &EndpointRef) {
        self.known_endpoints
            .lock()
            .unwrap()
            .remove(endpoint.as_str());
    }

    pub fn delivered(&self) -> Vec<(EndpointRef, BroadcastPayload)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn provisioned(&self) -> Vec<EndpointRef> {
        self.provisioned.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<EndpointRef> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn room_exists(&self, room_id: &RoomId) -> std::result::Result<bool, GatewayError> {
        if self
            .unreachable_rooms
            .lock()
            .unwrap()
            .contains(room_id.as_str())
        {
            return Err(GatewayError("room lookup failed".to_string()));
        }
        Ok(!self.missing_rooms.lock().unwrap().contains(room_id.as_str()))
    }

    async fn tenant_name(
        &self,
        tenant_id: &TenantId,
    ) -> std::result::Result<Option<String>, GatewayError> {
        Ok(self
            .tenant_names
            .lock()
            .unwrap()
            .get(tenant_id.as_str())
            .cloned())
    }

    async fn deliver(
        &self,
        endpoint: &EndpointRef,
        payload: &BroadcastPayload,
    ) -> std::result::Result<(), DeliveryError> {
        let behavior = self.scripted.lock().unwrap().get(endpoint.as_str()).copied();
        match behavior {
            Some(ScriptedDelivery::EndpointGone) => Err(DeliveryError::EndpointGone),
            Some(ScriptedDelivery::PermissionDenied) => Err(DeliveryError::PermissionDenied),
            Some(ScriptedDelivery::Transport) => {
                Err(DeliveryError::Transport("connection reset".to_string()))
            }
            Some(ScriptedDelivery::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => {
                self.delivered
                    .lock()
                    .unwrap()
                    .push((endpoint.clone(), payload.clone()));
                Ok(())
            }
        }
    }

    async fn provision_endpoint(
        &self,
        _tenant_id: &TenantId,
        _room_id: &RoomId,
    ) -> std::result::Result<EndpointRef, ProvisionError> {
        if self.provision_fails.load(Ordering::SeqCst) {
            return Err(ProvisionError::PermissionDenied(
                "manage endpoints privilege missing".to_string(),
            ));
        }
        let n = self.provision_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let endpoint = EndpointRef::from(format!("endpoint-{n}"));
        self.known_endpoints
            .lock()
            .unwrap()
            .insert(endpoint.as_str().to_string());
        self.provisioned.lock().unwrap().push(endpoint.clone());
        Ok(endpoint)
    }

    async fn destroy_endpoint(
        &self,
        endpoint: &EndpointRef,
    ) -> std::result::Result<(), ProvisionError> {
        // Endpoint-already-gone is success by contract.
        if self.known_endpoints.lock().unwrap().remove(endpoint.as_str()) {
            self.destroyed.lock().unwrap().push(endpoint.clone());
        }
        Ok(())
    }
}

/// In-memory store whose next upsert can be made to fail, for rollback tests.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemorySubscriptionStore,
    fail_next_upsert: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_upsert(&self) {
        self.fail_next_upsert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionStore for FlakyStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<()> {
        if self.fail_next_upsert.swap(false, Ordering::SeqCst) {
            return Err(Error::Internal("simulated store fault".to_string()));
        }
        self.inner.upsert(subscription).await
    }

    async fn get(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<Option<Subscription>> {
        self.inner.get(tenant_id, room_id).await
    }

    async fn remove_by_key(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<bool> {
        self.inner.remove_by_key(tenant_id, room_id).await
    }

    async fn remove_by_endpoint(&self, endpoint: &EndpointRef) -> Result<bool> {
        self.inner.remove_by_endpoint(endpoint).await
    }

    async fn list_enabled(&self) -> Result<Vec<Subscription>> {
        self.inner.list_enabled().await
    }

    async fn set_enabled(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
        enabled: bool,
    ) -> Result<bool> {
        self.inner.set_enabled(tenant_id, room_id, enabled).await
    }
}
