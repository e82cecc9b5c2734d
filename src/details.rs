use std::sync::Arc;

use crate::error::Result;
use crate::keys::{Key, Keyspace};
use crate::store::KvStore;

/// Free-form JSON document attached to a restaurant. Stored and returned as-is.
pub struct DetailsStore<S> {
    store: Arc<S>,
    keys: Keyspace,
}

impl<S> Clone for DetailsStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
        }
    }
}

impl<S: KvStore> DetailsStore<S> {
    pub fn new(store: Arc<S>, keys: Keyspace) -> Self {
        Self { store, keys }
    }

    pub async fn set(&self, restaurant_id: &str, document: &serde_json::Value) -> Result<()> {
        self.store
            .json_set(&self.keys.key(Key::Details(restaurant_id)), document)
            .await?;
        Ok(())
    }

    pub async fn get(&self, restaurant_id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .store
            .json_get(&self.keys.key(Key::Details(restaurant_id)))
            .await?)
    }
}
