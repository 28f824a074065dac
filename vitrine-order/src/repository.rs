use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{DeliverySettings, Order, OrderStatus};
use vitrine_core::{BoxError, OwnerId};

/// Order persistence seam.
///
/// `insert` and `replace` are atomic over the order header and its line
/// items: either everything is written, or nothing is.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), BoxError>;

    /// Overwrite an existing order wholesale, line items included.
    async fn replace(&self, order: &Order) -> Result<(), BoxError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, BoxError>;

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<Order>, BoxError>;

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<(), BoxError>;
}

/// Source of the single delivery-settings record.
#[async_trait]
pub trait DeliverySettingsSource: Send + Sync {
    /// `Ok(None)` means the record does not exist; pricing treats that as a
    /// hard error rather than assuming defaults.
    async fn load(&self) -> Result<Option<DeliverySettings>, BoxError>;
}
