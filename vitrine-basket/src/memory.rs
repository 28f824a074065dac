use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::basket::{BasketEntry, BasketStore};
use vitrine_core::{BoxError, OwnerId};

/// In-memory basket store keyed by (owner, product).
#[derive(Default)]
pub struct InMemoryBasket {
    entries: RwLock<HashMap<(String, Uuid), BasketEntry>>,
}

impl InMemoryBasket {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BasketStore for InMemoryBasket {
    async fn get(
        &self,
        owner: &OwnerId,
        product_id: Uuid,
    ) -> Result<Option<BasketEntry>, BoxError> {
        let entries = self.entries.read().expect("basket lock poisoned");
        Ok(entries.get(&(owner.storage_key(), product_id)).cloned())
    }

    async fn upsert(&self, entry: &BasketEntry) -> Result<(), BoxError> {
        let mut entries = self.entries.write().expect("basket lock poisoned");
        entries.insert((entry.owner.storage_key(), entry.product_id), entry.clone());
        Ok(())
    }

    async fn delete(&self, owner: &OwnerId, product_id: Uuid) -> Result<(), BoxError> {
        let mut entries = self.entries.write().expect("basket lock poisoned");
        entries.remove(&(owner.storage_key(), product_id));
        Ok(())
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<BasketEntry>, BoxError> {
        let key = owner.storage_key();
        let entries = self.entries.read().expect("basket lock poisoned");
        let mut found: Vec<BasketEntry> = entries
            .iter()
            .filter(|((owner_key, _), _)| *owner_key == key)
            .map(|(_, entry)| entry.clone())
            .collect();
        found.sort_by_key(|e| e.created_at);
        Ok(found)
    }

    async fn clear(&self, owner: &OwnerId) -> Result<u64, BoxError> {
        let key = owner.storage_key();
        let mut entries = self.entries.write().expect("basket lock poisoned");
        let before = entries.len();
        entries.retain(|(owner_key, _), _| *owner_key != key);
        Ok((before - entries.len()) as u64)
    }
}
