use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{DeliverySettings, Order, OrderStatus};
use crate::repository::{DeliverySettingsSource, OrderRepository};
use vitrine_core::{BoxError, OwnerId};

/// In-memory order repository for tests and single-process use.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.read().expect("order lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn insert(&self, order: &Order) -> Result<(), BoxError> {
        let mut orders = self.orders.write().expect("order lock poisoned");
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn replace(&self, order: &Order) -> Result<(), BoxError> {
        let mut orders = self.orders.write().expect("order lock poisoned");
        if !orders.contains_key(&order.id) {
            return Err(format!("order not found: {}", order.id).into());
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        Ok(self
            .orders
            .read()
            .expect("order lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<Order>, BoxError> {
        let orders = self.orders.read().expect("order lock poisoned");
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| o.owner == *owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<(), BoxError> {
        let mut orders = self.orders.write().expect("order lock poisoned");
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| format!("order not found: {}", id))?;
        order.status = status;
        Ok(())
    }
}

/// Fixed delivery settings, or deliberately none to exercise the
/// missing-settings failure path.
pub struct StaticDeliverySettings {
    settings: Option<DeliverySettings>,
}

impl StaticDeliverySettings {
    pub fn new(settings: DeliverySettings) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    pub fn missing() -> Self {
        Self { settings: None }
    }
}

#[async_trait]
impl DeliverySettingsSource for StaticDeliverySettings {
    async fn load(&self) -> Result<Option<DeliverySettings>, BoxError> {
        Ok(self.settings.clone())
    }
}
