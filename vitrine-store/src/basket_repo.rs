use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vitrine_basket::{BasketEntry, BasketStore};
use vitrine_core::{BoxError, OwnerId};

pub struct PgBasketStore {
    pool: PgPool,
}

impl PgBasketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BasketRow {
    owner_key: String,
    product_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl BasketRow {
    fn into_entry(self) -> Result<BasketEntry, BoxError> {
        let owner = OwnerId::from_storage_key(&self.owner_key)
            .ok_or_else(|| format!("malformed owner key: {}", self.owner_key))?;
        Ok(BasketEntry {
            owner,
            product_id: self.product_id,
            quantity: self.quantity.max(0) as u32,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl BasketStore for PgBasketStore {
    async fn get(
        &self,
        owner: &OwnerId,
        product_id: Uuid,
    ) -> Result<Option<BasketEntry>, BoxError> {
        let row: Option<BasketRow> = sqlx::query_as(
            "SELECT owner_key, product_id, quantity, created_at
             FROM basket_entries WHERE owner_key = $1 AND product_id = $2",
        )
        .bind(owner.storage_key())
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BasketRow::into_entry).transpose()
    }

    async fn upsert(&self, entry: &BasketEntry) -> Result<(), BoxError> {
        sqlx::query(
            "INSERT INTO basket_entries (owner_key, product_id, quantity, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (owner_key, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(entry.owner.storage_key())
        .bind(entry.product_id)
        .bind(entry.quantity as i32)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, owner: &OwnerId, product_id: Uuid) -> Result<(), BoxError> {
        sqlx::query("DELETE FROM basket_entries WHERE owner_key = $1 AND product_id = $2")
            .bind(owner.storage_key())
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<BasketEntry>, BoxError> {
        let rows: Vec<BasketRow> = sqlx::query_as(
            "SELECT owner_key, product_id, quantity, created_at
             FROM basket_entries WHERE owner_key = $1 ORDER BY created_at",
        )
        .bind(owner.storage_key())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BasketRow::into_entry).collect()
    }

    async fn clear(&self, owner: &OwnerId) -> Result<u64, BoxError> {
        let result = sqlx::query("DELETE FROM basket_entries WHERE owner_key = $1")
            .bind(owner.storage_key())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
