use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use vitrine_catalog::{CatalogLookup, ProductSnapshot, StockError};
use vitrine_core::BoxError;

pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    price: Decimal,
    count: i32,
    available: bool,
}

#[async_trait]
impl CatalogLookup for PgCatalog {
    async fn fetch_snapshots(&self, ids: &[Uuid]) -> Result<Vec<ProductSnapshot>, BoxError> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            "SELECT id, price, count, available FROM products WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductSnapshot {
                product_id: row.id,
                price: row.price,
                available_count: row.count.max(0) as u32,
                available: row.available,
            })
            .collect())
    }

    async fn commit_stock(&self, lines: &[(Uuid, u32)]) -> Result<(), StockError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StockError::Storage(e.to_string()))?;

        // Conditional decrement: the WHERE clause is the stock check, so
        // check and consume happen in one statement. Any miss rolls back
        // every decrement made so far. Rows are locked in product-id order
        // so two concurrent commits over the same products cannot deadlock.
        let mut lines = lines.to_vec();
        lines.sort_by_key(|(product_id, _)| *product_id);

        for (product_id, requested) in &lines {
            let result = sqlx::query(
                "UPDATE products SET count = count - $2 WHERE id = $1 AND count >= $2",
            )
            .bind(product_id)
            .bind(*requested as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| StockError::Storage(e.to_string()))?;

            if result.rows_affected() == 0 {
                let available: Option<(i32,)> =
                    sqlx::query_as("SELECT count FROM products WHERE id = $1")
                        .bind(product_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| StockError::Storage(e.to_string()))?;

                tx.rollback()
                    .await
                    .map_err(|e| StockError::Storage(e.to_string()))?;

                return Err(match available {
                    None => StockError::NotFound(*product_id),
                    Some((count,)) => StockError::Insufficient {
                        product_id: *product_id,
                        requested: *requested,
                        available: count.max(0) as u32,
                    },
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| StockError::Storage(e.to_string()))
    }

    async fn release_stock(&self, lines: &[(Uuid, u32)]) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        // Same lock order as commit_stock.
        let mut lines = lines.to_vec();
        lines.sort_by_key(|(product_id, _)| *product_id);

        for (product_id, quantity) in &lines {
            sqlx::query("UPDATE products SET count = count + $2 WHERE id = $1")
                .bind(product_id)
                .bind(*quantity as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
