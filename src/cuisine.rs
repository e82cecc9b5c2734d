//! Cuisine index - three views of the restaurant/cuisine relation.
//!
//! The global tag set, the per-tag restaurant set and the per-restaurant tag set
//! are written together at creation time and never mutated afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::error::Result;
use crate::keys::{Key, Keyspace};
use crate::store::KvStore;

pub struct CuisineIndex<S> {
    store: Arc<S>,
    keys: Keyspace,
}

impl<S> Clone for CuisineIndex<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
        }
    }
}

impl<S: KvStore> CuisineIndex<S> {
    pub fn new(store: Arc<S>, keys: Keyspace) -> Self {
        Self { store, keys }
    }

    /// Link a restaurant to its tags: three set-adds per tag, all in parallel.
    pub async fn attach(&self, restaurant_id: &str, tags: &BTreeSet<String>) -> Result<()> {
        let all_tags = self.keys.key(Key::Cuisines);
        let own_tags = self.keys.key(Key::RestaurantCuisines(restaurant_id));
        let per_tag: Vec<String> = tags
            .iter()
            .map(|tag| self.keys.key(Key::Cuisine(tag)))
            .collect();

        let writes = tags.iter().zip(&per_tag).flat_map(|(tag, tag_key)| {
            [
                self.store.sadd(&all_tags, tag),
                self.store.sadd(tag_key, restaurant_id),
                self.store.sadd(&own_tags, tag),
            ]
        });
        try_join_all(writes).await?;

        debug!(restaurant_id, tags = tags.len(), "cuisine tags attached");
        Ok(())
    }

    pub async fn tags_of(&self, restaurant_id: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .store
            .smembers(&self.keys.key(Key::RestaurantCuisines(restaurant_id)))
            .await?)
    }

    /// Restaurant ids carrying `tag`, in a stable order.
    pub async fn restaurants_by_tag(&self, tag: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .smembers(&self.keys.key(Key::Cuisine(tag)))
            .await?
            .into_iter()
            .collect())
    }

    pub async fn all_tags(&self) -> Result<BTreeSet<String>> {
        Ok(self.store.smembers(&self.keys.key(Key::Cuisines)).await?)
    }
}
