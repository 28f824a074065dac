use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use vitrine_core::{BoxError, OwnerId};
use vitrine_order::{
    DeliveryType, LineItem, Order, OrderRepository, OrderStatus, PaymentType,
};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        items: &[LineItem],
    ) -> Result<(), sqlx::Error> {
        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity as i32)
            .bind(item.unit_price)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn fetch_items(&self, order_id: Uuid) -> Result<Vec<LineItem>, BoxError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT product_id, quantity, unit_price FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LineItem {
                product_id: row.product_id,
                quantity: row.quantity.max(0) as u32,
                unit_price: row.unit_price,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    owner_key: String,
    created_at: DateTime<Utc>,
    delivery_type: String,
    payment_type: String,
    city: String,
    address: String,
    status: String,
    total_cost: Decimal,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Result<Order, BoxError> {
        let owner = OwnerId::from_storage_key(&self.owner_key)
            .ok_or_else(|| format!("malformed owner key: {}", self.owner_key))?;
        Ok(Order {
            id: self.id,
            owner,
            created_at: self.created_at,
            delivery_type: DeliveryType::from_str(&self.delivery_type)?,
            payment_type: PaymentType::from_str(&self.payment_type)?,
            city: self.city,
            address: self.address,
            status: OrderStatus::from_str(&self.status)?,
            items,
            total_cost: self.total_cost,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders
               (id, owner_key, created_at, delivery_type, payment_type,
                city, address, status, total_cost)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id)
        .bind(order.owner.storage_key())
        .bind(order.created_at)
        .bind(order.delivery_type.as_str())
        .bind(order.payment_type.as_str())
        .bind(&order.city)
        .bind(&order.address)
        .bind(order.status.as_str())
        .bind(order.total_cost)
        .execute(&mut *tx)
        .await?;

        Self::insert_items(&mut tx, order.id, &order.items).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace(&self, order: &Order) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET delivery_type = $2, payment_type = $3, city = $4,
                    address = $5, status = $6, total_cost = $7
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.delivery_type.as_str())
        .bind(order.payment_type.as_str())
        .bind(&order.city)
        .bind(&order.address)
        .bind(order.status.as_str())
        .bind(order.total_cost)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("order not found: {}", order.id).into());
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_items(&mut tx, order.id, &order.items).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, owner_key, created_at, delivery_type, payment_type,
                    city, address, status, total_cost
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.fetch_items(id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<Order>, BoxError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, owner_key, created_at, delivery_type, payment_type,
                    city, address, status, total_cost
             FROM orders WHERE owner_key = $1 ORDER BY created_at DESC",
        )
        .bind(owner.storage_key())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.fetch_items(row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<(), BoxError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(format!("order not found: {}", id).into());
        }
        Ok(())
    }
}
