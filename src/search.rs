//! Search façade - prefix search over restaurant names.
//!
//! The index is declared over restaurant record hashes and built once during
//! environment setup; request paths only query it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::keys::{Key, Keyspace};
use crate::record::HashRecord;
use crate::restaurant::{Restaurant, AVERAGE_RATING, NAME};
use crate::store::{FieldKind, IndexDefinition, KvStore, SchemaField, SearchQuery, StoreError};

pub struct SearchFacade<S> {
    store: Arc<S>,
    definition: IndexDefinition,
}

impl<S> Clone for SearchFacade<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            definition: self.definition.clone(),
        }
    }
}

impl<S: KvStore> SearchFacade<S> {
    pub fn new(store: Arc<S>, keys: &Keyspace) -> Self {
        Self {
            store,
            definition: Self::index_definition(keys),
        }
    }

    /// Restaurant names as free text and the average rating as a sortable number,
    /// over every key under the restaurant record prefix.
    pub fn index_definition(keys: &Keyspace) -> IndexDefinition {
        IndexDefinition {
            name: keys.key(Key::SearchIndex),
            prefixes: vec![keys.restaurant_prefix()],
            schema: vec![
                SchemaField {
                    name: NAME.to_string(),
                    kind: FieldKind::Text,
                },
                SchemaField {
                    name: AVERAGE_RATING.to_string(),
                    kind: FieldKind::Numeric { sortable: true },
                },
            ],
        }
    }

    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// Create the index. Idempotent; part of environment setup only.
    pub async fn ensure_index(&self) -> Result<()> {
        match self.store.ft_create(&self.definition).await {
            Ok(()) => {
                debug!(index = %self.definition.name, "search index created");
                Ok(())
            }
            Err(StoreError::IndexExists(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Restaurants with a name word starting with `prefix`, best rated first.
    pub async fn search(&self, prefix: &str, offset: u64, limit: u64) -> Result<Vec<Restaurant>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::Validation("search text is required".into()));
        }

        let query = SearchQuery {
            field: NAME.to_string(),
            prefix: prefix.to_string(),
            sort_desc_by: Some(AVERAGE_RATING.to_string()),
            offset,
            limit,
        };
        let hits = self.store.ft_search(&self.definition.name, &query).await?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| match Restaurant::from_fields(&hit.fields) {
                Ok(restaurant) => Some(restaurant),
                Err(err) => {
                    warn!(key = %hit.key, error = %err, "unreadable search hit; skipping");
                    None
                }
            })
            .collect())
    }
}
