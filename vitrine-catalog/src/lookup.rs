use async_trait::async_trait;
use uuid::Uuid;

use crate::product::ProductSnapshot;
use vitrine_core::BoxError;

/// Batch access to product price/availability plus stock commitment.
///
/// `commit_stock` is all-or-nothing across every requested line: either all
/// decrements apply or none do. Implementations must check-and-decrement in
/// one critical section (in-memory lock, or a conditional UPDATE inside one
/// database transaction) so two concurrent checkouts cannot both pass the
/// same stock check.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Fetch snapshots for the given ids. Unknown ids are simply absent from
    /// the result; callers diff against the request to report missing ones.
    async fn fetch_snapshots(&self, ids: &[Uuid]) -> Result<Vec<ProductSnapshot>, BoxError>;

    /// Atomically consume stock for every `(product_id, quantity)` line.
    async fn commit_stock(&self, lines: &[(Uuid, u32)]) -> Result<(), StockError>;

    /// Return previously committed stock (persist failure, cancellation).
    async fn release_stock(&self, lines: &[(Uuid, u32)]) -> Result<(), BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("product not found: {0}")]
    NotFound(Uuid),

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    Insufficient {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("stock storage failure: {0}")]
    Storage(String),
}
