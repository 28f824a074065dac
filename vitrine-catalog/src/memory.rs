use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::lookup::{CatalogLookup, StockError};
use crate::product::{Product, ProductSnapshot};
use crate::review::{RatingHook, RatingSummary};
use vitrine_core::BoxError;

/// In-memory catalog backing the managers and tests.
///
/// All stock mutations for one commit happen under a single write lock, so
/// per-product checks are serialized against concurrent checkouts.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) -> Uuid {
        let id = product.id;
        self.products
            .write()
            .expect("catalog lock poisoned")
            .insert(id, product);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Product> {
        self.products
            .read()
            .expect("catalog lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn set_available(&self, id: &Uuid, available: bool) {
        if let Some(product) = self
            .products
            .write()
            .expect("catalog lock poisoned")
            .get_mut(id)
        {
            product.available = available;
        }
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn fetch_snapshots(&self, ids: &[Uuid]) -> Result<Vec<ProductSnapshot>, BoxError> {
        let products = self.products.read().expect("catalog lock poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id).map(Product::snapshot))
            .collect())
    }

    async fn commit_stock(&self, lines: &[(Uuid, u32)]) -> Result<(), StockError> {
        let mut products = self.products.write().expect("catalog lock poisoned");

        // Validate every line before touching any count.
        for (product_id, requested) in lines {
            let product = products
                .get(product_id)
                .ok_or(StockError::NotFound(*product_id))?;
            if product.count < *requested {
                return Err(StockError::Insufficient {
                    product_id: *product_id,
                    requested: *requested,
                    available: product.count,
                });
            }
        }

        for (product_id, requested) in lines {
            if let Some(product) = products.get_mut(product_id) {
                product.count -= requested;
            }
        }

        Ok(())
    }

    async fn release_stock(&self, lines: &[(Uuid, u32)]) -> Result<(), BoxError> {
        let mut products = self.products.write().expect("catalog lock poisoned");
        for (product_id, quantity) in lines {
            if let Some(product) = products.get_mut(product_id) {
                product.count = product.count.saturating_add(*quantity);
            }
        }
        Ok(())
    }
}

impl RatingHook for InMemoryCatalog {
    fn rating_changed(&self, product_id: Uuid, summary: RatingSummary) {
        if let Some(product) = self
            .products
            .write()
            .expect("catalog lock poisoned")
            .get_mut(&product_id)
        {
            product.rating = summary.rating;
            product.reviews_count = summary.reviews_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn fetch_skips_unknown_ids() {
        let catalog = InMemoryCatalog::new();
        let known = catalog.insert(Product::new("Lamp", Decimal::new(4999, 2), 10));

        let snapshots = catalog
            .fetch_snapshots(&[known, Uuid::new_v4()])
            .await
            .unwrap();

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].product_id, known);
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let catalog = InMemoryCatalog::new();
        let plenty = catalog.insert(Product::new("Mug", Decimal::new(500, 2), 10));
        let scarce = catalog.insert(Product::new("Vase", Decimal::new(1500, 2), 1));

        let err = catalog
            .commit_stock(&[(plenty, 2), (scarce, 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::Insufficient { available: 1, .. }));

        // The passing line must not have been decremented.
        assert_eq!(catalog.get(&plenty).unwrap().count, 10);
    }

    #[tokio::test]
    async fn release_returns_committed_stock() {
        let catalog = InMemoryCatalog::new();
        let id = catalog.insert(Product::new("Chair", Decimal::new(12000, 2), 5));

        catalog.commit_stock(&[(id, 4)]).await.unwrap();
        assert_eq!(catalog.get(&id).unwrap().count, 1);

        catalog.release_stock(&[(id, 4)]).await.unwrap();
        assert_eq!(catalog.get(&id).unwrap().count, 5);
    }
}
