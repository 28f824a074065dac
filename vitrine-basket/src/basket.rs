use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_catalog::CatalogLookup;
use vitrine_core::{BoxError, OwnerId};

/// One product line in an owner's basket. At most one entry exists per
/// (owner, product); repeated adds merge into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketEntry {
    pub owner: OwnerId,
    pub product_id: Uuid,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// Persistence seam for basket entries.
#[async_trait]
pub trait BasketStore: Send + Sync {
    async fn get(&self, owner: &OwnerId, product_id: Uuid)
        -> Result<Option<BasketEntry>, BoxError>;
    async fn upsert(&self, entry: &BasketEntry) -> Result<(), BoxError>;
    async fn delete(&self, owner: &OwnerId, product_id: Uuid) -> Result<(), BoxError>;
    async fn list(&self, owner: &OwnerId) -> Result<Vec<BasketEntry>, BoxError>;
    /// Drop every entry for the owner; returns how many were removed.
    async fn clear(&self, owner: &OwnerId) -> Result<u64, BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BasketError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("product not available for order: {0}")]
    ProductUnavailable(Uuid),

    #[error("insufficient stock, available: {available}")]
    InsufficientStock { available: u32 },

    #[error("product not in basket: {0}")]
    NotInBasket(Uuid),

    #[error("basket storage failure: {0}")]
    Storage(String),
}

/// Result of a removal: the surviving entry, or nothing.
#[derive(Debug, Clone)]
pub enum BasketChange {
    Updated(BasketEntry),
    Removed,
}

/// Applies the basket merge rules on top of a `BasketStore`, checking stock
/// against the catalog before every add.
///
/// Adds are read-then-decide: the basket never consumes stock, checkout does
/// (atomically), so a stale check here costs nothing but a later checkout
/// error.
pub struct BasketManager {
    catalog: Arc<dyn CatalogLookup>,
    store: Arc<dyn BasketStore>,
}

impl BasketManager {
    pub fn new(catalog: Arc<dyn CatalogLookup>, store: Arc<dyn BasketStore>) -> Self {
        Self { catalog, store }
    }

    /// Add `quantity` units of a product; repeat adds for the same
    /// (owner, product) merge by summing, capped by available stock.
    pub async fn add(
        &self,
        owner: &OwnerId,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<BasketEntry, BasketError> {
        if quantity == 0 {
            return Err(BasketError::ZeroQuantity);
        }

        let snapshots = self
            .catalog
            .fetch_snapshots(&[product_id])
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))?;
        let snapshot = snapshots
            .into_iter()
            .next()
            .ok_or(BasketError::ProductNotFound(product_id))?;

        if !snapshot.is_sellable() {
            return Err(BasketError::ProductUnavailable(product_id));
        }

        let existing = self
            .store
            .get(owner, product_id)
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))?;

        // An overflowing total can never fit in stock either.
        let merged = existing
            .as_ref()
            .map_or(Some(quantity), |e| e.quantity.checked_add(quantity));
        let merged = match merged {
            Some(total) if total <= snapshot.available_count => total,
            _ => {
                return Err(BasketError::InsufficientStock {
                    available: snapshot.available_count,
                })
            }
        };

        let entry = BasketEntry {
            owner: owner.clone(),
            product_id,
            quantity: merged,
            created_at: existing.map_or_else(Utc::now, |e| e.created_at),
        };
        self.store
            .upsert(&entry)
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))?;

        tracing::info!(owner = %owner, %product_id, quantity = merged, "basket add");
        Ok(entry)
    }

    /// Remove up to `quantity` units; removing at least the current quantity
    /// deletes the entry.
    pub async fn remove(
        &self,
        owner: &OwnerId,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<BasketChange, BasketError> {
        if quantity == 0 {
            return Err(BasketError::ZeroQuantity);
        }

        let entry = self
            .store
            .get(owner, product_id)
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))?
            .ok_or(BasketError::NotInBasket(product_id))?;

        if quantity >= entry.quantity {
            self.store
                .delete(owner, product_id)
                .await
                .map_err(|e| BasketError::Storage(e.to_string()))?;
            tracing::info!(owner = %owner, %product_id, "basket entry removed");
            return Ok(BasketChange::Removed);
        }

        let updated = BasketEntry {
            quantity: entry.quantity - quantity,
            ..entry
        };
        self.store
            .upsert(&updated)
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))?;
        Ok(BasketChange::Updated(updated))
    }

    /// Basket view returned to the caller after every mutation.
    pub async fn contents(&self, owner: &OwnerId) -> Result<Vec<BasketEntry>, BasketError> {
        self.store
            .list(owner)
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))
    }

    pub async fn clear(&self, owner: &OwnerId) -> Result<u64, BasketError> {
        self.store
            .clear(owner)
            .await
            .map_err(|e| BasketError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBasket;
    use rust_decimal::Decimal;
    use vitrine_catalog::{InMemoryCatalog, Product};

    fn setup() -> (Arc<InMemoryCatalog>, BasketManager) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let manager = BasketManager::new(
            Arc::clone(&catalog) as Arc<dyn CatalogLookup>,
            Arc::new(InMemoryBasket::new()),
        );
        (catalog, manager)
    }

    fn owner() -> OwnerId {
        OwnerId::User(Uuid::new_v4())
    }

    #[tokio::test]
    async fn repeat_adds_merge_into_one_entry() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Kettle", Decimal::new(3500, 2), 10));
        let owner = owner();

        basket.add(&owner, product_id, 3).await.unwrap();
        let entry = basket.add(&owner, product_id, 2).await.unwrap();
        assert_eq!(entry.quantity, 5);

        let contents = basket.contents(&owner).await.unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].quantity, 5);
    }

    #[tokio::test]
    async fn merged_quantity_is_capped_by_stock() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Plate", Decimal::new(800, 2), 4));
        let owner = owner();

        basket.add(&owner, product_id, 3).await.unwrap();
        let err = basket.add(&owner, product_id, 2).await.unwrap_err();
        assert!(matches!(err, BasketError::InsufficientStock { available: 4 }));

        // The original entry is untouched.
        assert_eq!(basket.contents(&owner).await.unwrap()[0].quantity, 3);
    }

    #[tokio::test]
    async fn merged_quantity_overflow_reads_as_insufficient_stock() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Tray", Decimal::new(1500, 2), 5));
        let owner = owner();

        basket.add(&owner, product_id, 3).await.unwrap();
        let err = basket.add(&owner, product_id, u32::MAX - 1).await.unwrap_err();
        assert!(matches!(err, BasketError::InsufficientStock { available: 5 }));
        assert_eq!(basket.contents(&owner).await.unwrap()[0].quantity, 3);
    }

    #[tokio::test]
    async fn unavailable_product_is_rejected() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Rug", Decimal::new(20000, 2), 7));
        catalog.set_available(&product_id, false);

        let err = basket.add(&owner(), product_id, 1).await.unwrap_err();
        assert!(matches!(err, BasketError::ProductUnavailable(id) if id == product_id));
    }

    #[tokio::test]
    async fn zero_stock_counts_as_unavailable() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Clock", Decimal::new(1200, 2), 0));

        let err = basket.add(&owner(), product_id, 1).await.unwrap_err();
        assert!(matches!(err, BasketError::ProductUnavailable(_)));
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let (_catalog, basket) = setup();
        let err = basket.add(&owner(), Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, BasketError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn removing_more_than_held_deletes_the_entry() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Bowl", Decimal::new(900, 2), 10));
        let owner = owner();

        basket.add(&owner, product_id, 2).await.unwrap();
        let change = basket.remove(&owner, product_id, 5).await.unwrap();
        assert!(matches!(change, BasketChange::Removed));
        assert!(basket.contents(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_removal_decrements() {
        let (catalog, basket) = setup();
        let product_id = catalog.insert(Product::new("Fork", Decimal::new(300, 2), 10));
        let owner = owner();

        basket.add(&owner, product_id, 4).await.unwrap();
        let change = basket.remove(&owner, product_id, 1).await.unwrap();
        match change {
            BasketChange::Updated(entry) => assert_eq!(entry.quantity, 3),
            BasketChange::Removed => panic!("entry should survive"),
        }
    }

    #[tokio::test]
    async fn clear_drops_every_entry_for_the_owner() {
        let (catalog, basket) = setup();
        let first = catalog.insert(Product::new("Pan", Decimal::new(2500, 2), 5));
        let second = catalog.insert(Product::new("Pot", Decimal::new(4000, 2), 5));
        let owner = owner();
        let other = OwnerId::Session("anon-1".to_string());

        basket.add(&owner, first, 1).await.unwrap();
        basket.add(&owner, second, 2).await.unwrap();
        basket.add(&other, first, 1).await.unwrap();

        assert_eq!(basket.clear(&owner).await.unwrap(), 2);
        assert!(basket.contents(&owner).await.unwrap().is_empty());
        assert_eq!(basket.contents(&other).await.unwrap().len(), 1);
    }
}
