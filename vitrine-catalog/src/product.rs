use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product as the storefront sells it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Units in stock.
    pub count: u32,
    /// Merchandising switch; a product with stock can still be pulled from sale.
    pub available: bool,
    pub rating: Decimal,
    pub reviews_count: u32,
}

impl Product {
    pub fn new(title: impl Into<String>, price: Decimal, count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            price,
            count,
            available: true,
            rating: Decimal::ZERO,
            reviews_count: 0,
        }
    }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.id,
            price: self.price,
            available_count: self.count,
            available: self.available,
        }
    }
}

/// Point-in-time view of price and availability, the only product data the
/// pricing workflow is allowed to read. Orders freeze the price they saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub price: Decimal,
    pub available_count: u32,
    pub available: bool,
}

impl ProductSnapshot {
    /// Sellable right now: on sale and at least one unit in stock.
    pub fn is_sellable(&self) -> bool {
        self.available && self.available_count > 0
    }
}
