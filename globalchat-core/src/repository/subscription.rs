use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use super::SubscriptionStore;
use crate::{
    models::{EndpointRef, RoomId, Subscription, TenantId},
    Result,
};

/// Postgres-backed subscription registry.
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_subscription(row: &PgRow) -> Result<Subscription> {
        Ok(Subscription {
            tenant_id: row.try_get("tenant_id")?,
            room_id: row.try_get("room_id")?,
            endpoint_ref: row.try_get("endpoint_ref")?,
            enabled: row.try_get("enabled")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionRepository {
    async fn upsert(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO subscriptions (tenant_id, room_id, endpoint_ref, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, room_id)
            DO UPDATE SET endpoint_ref = EXCLUDED.endpoint_ref, enabled = EXCLUDED.enabled
            ",
        )
        .bind(&subscription.tenant_id)
        .bind(&subscription.room_id)
        .bind(&subscription.endpoint_ref)
        .bind(subscription.enabled)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<Option<Subscription>> {
        let row = sqlx::query(
            r"
            SELECT tenant_id, room_id, endpoint_ref, enabled, created_at
            FROM subscriptions
            WHERE tenant_id = $1 AND room_id = $2
            ",
        )
        .bind(tenant_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_subscription(&row)?)),
            None => Ok(None),
        }
    }

    async fn remove_by_key(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM subscriptions
            WHERE tenant_id = $1 AND room_id = $2
            ",
        )
        .bind(tenant_id)
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_by_endpoint(&self, endpoint: &EndpointRef) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM subscriptions
            WHERE endpoint_ref = $1
            ",
        )
        .bind(endpoint)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_enabled(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(
            r"
            SELECT tenant_id, room_id, endpoint_ref, enabled, created_at
            FROM subscriptions
            WHERE enabled = TRUE
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_subscription).collect()
    }

    async fn set_enabled(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
        enabled: bool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE subscriptions
            SET enabled = $3
            WHERE tenant_id = $1 AND room_id = $2
            ",
        )
        .bind(tenant_id)
        .bind(room_id)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
