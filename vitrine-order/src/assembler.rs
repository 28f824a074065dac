use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::delivery::delivery_fee;
use crate::models::{DeliveryType, LineItem, Order, OrderStatus, PaymentType};
use crate::pricing::{order_subtotal, PricingError};
use crate::repository::{DeliverySettingsSource, OrderRepository};
use vitrine_basket::BasketStore;
use vitrine_catalog::{CatalogLookup, StockError};
use vitrine_core::OwnerId;

/// One requested order line as submitted by a caller.
#[derive(Debug, Clone)]
pub struct RequestedLine {
    pub product_id: Uuid,
    pub quantity: u32,
    /// Client-side price, only honored for [`PriceSource::Trusted`] callers.
    pub price_hint: Option<Decimal>,
}

/// Delivery and payment details for an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub delivery_type: DeliveryType,
    pub payment_type: PaymentType,
    pub city: String,
    pub address: String,
}

/// Where unit prices come from, decided by the caller's authentication
/// context instead of inferred from the request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Catalog is authoritative; price hints are ignored. The default path,
    /// immune to client price tampering.
    Catalog,
    /// Internal callers may supply the captured price; lines without a hint
    /// still fall back to the catalog.
    Trusted,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order must contain at least one line item")]
    EmptyOrder,

    #[error("line for product {0} has zero quantity")]
    ZeroQuantityLine(Uuid),

    #[error("line for product {0} has a negative price")]
    NegativePrice(Uuid),

    #[error("products not found: {0:?}")]
    ProductsNotFound(Vec<Uuid>),

    #[error("delivery settings not configured")]
    MissingDeliverySettings,

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("order can no longer be edited in status {status}")]
    EditRejected { status: OrderStatus },

    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("order storage failure: {0}")]
    Storage(String),
}

impl From<PricingError> for OrderError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::EmptyOrder => OrderError::EmptyOrder,
            PricingError::MissingDeliverySettings => OrderError::MissingDeliverySettings,
        }
    }
}

/// Turns validated line requests into persisted, priced, immutable orders.
///
/// Assembly is all-or-nothing: stock is consumed atomically before the
/// order is written, and released again if the write fails. Basket clearing
/// after a successful checkout is best-effort cleanup only.
pub struct OrderAssembler {
    catalog: Arc<dyn CatalogLookup>,
    basket: Arc<dyn BasketStore>,
    orders: Arc<dyn OrderRepository>,
    settings: Arc<dyn DeliverySettingsSource>,
}

impl OrderAssembler {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        basket: Arc<dyn BasketStore>,
        orders: Arc<dyn OrderRepository>,
        settings: Arc<dyn DeliverySettingsSource>,
    ) -> Self {
        Self {
            catalog,
            basket,
            orders,
            settings,
        }
    }

    /// Create an order from the requested lines and persist it.
    pub async fn assemble(
        &self,
        owner: &OwnerId,
        lines: Vec<RequestedLine>,
        request: OrderRequest,
        price_source: PriceSource,
    ) -> Result<Order, OrderError> {
        let items = self.resolve_lines(lines, price_source).await?;
        let total_cost = self.price(&items, request.delivery_type).await?;

        let stock_lines: Vec<(Uuid, u32)> =
            items.iter().map(|i| (i.product_id, i.quantity)).collect();
        self.catalog.commit_stock(&stock_lines).await?;

        let order = Order {
            id: Uuid::new_v4(),
            owner: owner.clone(),
            created_at: Utc::now(),
            delivery_type: request.delivery_type,
            payment_type: request.payment_type,
            city: request.city,
            address: request.address,
            status: OrderStatus::PendingPayment,
            items,
            total_cost,
        };

        if let Err(err) = self.orders.insert(&order).await {
            self.release_committed(&stock_lines).await;
            return Err(OrderError::Storage(err.to_string()));
        }

        tracing::info!(order_id = %order.id, owner = %owner, total = %order.total_cost, "order assembled");

        // The order already succeeded; a failed basket clear is cleanup debt,
        // not a reason to roll anything back.
        if let Err(err) = self.basket.clear(owner).await {
            tracing::warn!(owner = %owner, error = %err, "basket clear after checkout failed");
        }

        Ok(order)
    }

    /// Replace an order's entire line set and delivery details, re-deriving
    /// the total from scratch. Only pending-payment orders can be edited.
    pub async fn update(
        &self,
        order_id: Uuid,
        owner: &OwnerId,
        lines: Vec<RequestedLine>,
        request: OrderRequest,
        price_source: PriceSource,
    ) -> Result<Order, OrderError> {
        let existing = self.load_owned(order_id, owner).await?;
        if existing.status != OrderStatus::PendingPayment {
            return Err(OrderError::EditRejected {
                status: existing.status,
            });
        }

        // The previous line set is not assumed valid: products are resolved
        // and priced anew, exactly as at creation.
        let items = self.resolve_lines(lines, price_source).await?;
        let total_cost = self.price(&items, request.delivery_type).await?;

        // Stock moves by per-product delta: units the order already holds
        // stay held, so an edit that keeps a line never competes with the
        // order's own reservation.
        let old_quantities: HashMap<Uuid, u32> = existing
            .items
            .iter()
            .map(|i| (i.product_id, i.quantity))
            .collect();
        let mut increases: Vec<(Uuid, u32)> = Vec::new();
        let mut decreases: Vec<(Uuid, u32)> = Vec::new();
        for item in &items {
            let held = old_quantities.get(&item.product_id).copied().unwrap_or(0);
            if item.quantity > held {
                increases.push((item.product_id, item.quantity - held));
            } else if held > item.quantity {
                decreases.push((item.product_id, held - item.quantity));
            }
        }
        for (product_id, held) in &old_quantities {
            if !items.iter().any(|i| i.product_id == *product_id) {
                decreases.push((*product_id, *held));
            }
        }

        if !increases.is_empty() {
            self.catalog.commit_stock(&increases).await?;
        }

        let updated = Order {
            delivery_type: request.delivery_type,
            payment_type: request.payment_type,
            city: request.city,
            address: request.address,
            items,
            total_cost,
            ..existing
        };

        if let Err(err) = self.orders.replace(&updated).await {
            self.release_committed(&increases).await;
            return Err(OrderError::Storage(err.to_string()));
        }

        if !decreases.is_empty() {
            self.release_committed(&decreases).await;
        }

        tracing::info!(%order_id, total = %updated.total_cost, "order updated");
        Ok(updated)
    }

    /// Move an order along the status lifecycle. Cancellation returns the
    /// order's stock to the catalog.
    pub async fn transition(
        &self,
        order_id: Uuid,
        to: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut order = self
            .orders
            .get(order_id)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or(OrderError::NotFound(order_id))?;

        if !order.status.can_transition_to(to) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status,
                to,
            });
        }

        self.orders
            .set_status(order_id, to)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?;

        if to == OrderStatus::Cancelled {
            let lines: Vec<(Uuid, u32)> = order
                .items
                .iter()
                .map(|i| (i.product_id, i.quantity))
                .collect();
            self.release_committed(&lines).await;
        }

        tracing::info!(%order_id, from = %order.status, %to, "order status changed");
        order.status = to;
        Ok(order)
    }

    /// Order summary view for display.
    pub async fn get(&self, order_id: Uuid, owner: &OwnerId) -> Result<Order, OrderError> {
        self.load_owned(order_id, owner).await
    }

    pub async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<Order>, OrderError> {
        self.orders
            .list_for_owner(owner)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Fetch an order, treating someone else's order as not found.
    async fn load_owned(&self, order_id: Uuid, owner: &OwnerId) -> Result<Order, OrderError> {
        let order = self
            .orders
            .get(order_id)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or(OrderError::NotFound(order_id))?;
        if order.owner != *owner {
            return Err(OrderError::NotFound(order_id));
        }
        Ok(order)
    }

    /// Validate requested lines and freeze unit prices.
    async fn resolve_lines(
        &self,
        lines: Vec<RequestedLine>,
        price_source: PriceSource,
    ) -> Result<Vec<LineItem>, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        // Repeated ids collapse into one line; orders hold one line per product.
        let mut merged: Vec<RequestedLine> = Vec::new();
        for line in lines {
            if line.quantity == 0 {
                return Err(OrderError::ZeroQuantityLine(line.product_id));
            }
            match merged.iter_mut().find(|l| l.product_id == line.product_id) {
                // Saturate rather than wrap: a saturated total still exceeds
                // any real stock level, so the stock commit rejects it.
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => merged.push(line),
            }
        }

        let ids: Vec<Uuid> = merged.iter().map(|l| l.product_id).collect();
        let snapshots = self
            .catalog
            .fetch_snapshots(&ids)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?;
        let by_id: HashMap<Uuid, _> = snapshots
            .into_iter()
            .map(|s| (s.product_id, s))
            .collect();

        // Report every unresolved id, not just the first.
        let mut missing: Vec<Uuid> = ids.iter().filter(|id| !by_id.contains_key(id)).copied().collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(OrderError::ProductsNotFound(missing));
        }

        merged
            .into_iter()
            .map(|line| {
                let snapshot = &by_id[&line.product_id];
                let unit_price = match price_source {
                    PriceSource::Catalog => snapshot.price,
                    PriceSource::Trusted => line.price_hint.unwrap_or(snapshot.price),
                };
                if unit_price < Decimal::ZERO {
                    return Err(OrderError::NegativePrice(line.product_id));
                }
                Ok(LineItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price,
                })
            })
            .collect()
    }

    /// Subtotal plus delivery fee under the current settings record.
    async fn price(
        &self,
        items: &[LineItem],
        delivery_type: DeliveryType,
    ) -> Result<Decimal, OrderError> {
        let subtotal = order_subtotal(items)?;
        let settings = self
            .settings
            .load()
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?;
        let fee = delivery_fee(subtotal, delivery_type, settings.as_ref())?;
        Ok(subtotal + fee)
    }

    async fn release_committed(&self, lines: &[(Uuid, u32)]) {
        if let Err(err) = self.catalog.release_stock(lines).await {
            tracing::warn!(error = %err, "failed to release committed stock");
        }
    }
}
