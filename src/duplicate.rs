//! Duplicate detector - approximate membership over `name|location` signatures.
//!
//! `probably_exists == false` means the signature is definitely new. The
//! probe-then-record sequence is not atomic: two concurrent identical submissions
//! can both pass the probe.

use std::sync::Arc;

use tracing::debug;

use crate::config::DuplicateFilterConfig;
use crate::error::Result;
use crate::keys::{Key, Keyspace};
use crate::store::{KvStore, StoreError};

pub struct DuplicateDetector<S> {
    store: Arc<S>,
    key: String,
    config: DuplicateFilterConfig,
}

impl<S> Clone for DuplicateDetector<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: KvStore> DuplicateDetector<S> {
    pub fn new(store: Arc<S>, keys: &Keyspace, config: DuplicateFilterConfig) -> Self {
        Self {
            store,
            key: keys.key(Key::DuplicateFilter),
            config,
        }
    }

    /// Reserve the filter with the configured rate and capacity. Idempotent.
    pub async fn reserve(&self) -> Result<()> {
        match self
            .store
            .bf_reserve(&self.key, self.config.error_rate, self.config.capacity)
            .await
        {
            Ok(()) => {
                debug!(
                    key = %self.key,
                    error_rate = self.config.error_rate,
                    capacity = self.config.capacity,
                    "duplicate filter reserved"
                );
                Ok(())
            }
            Err(StoreError::FilterExists(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn probably_exists(&self, signature: &str) -> Result<bool> {
        Ok(self.store.bf_exists(&self.key, signature).await?)
    }

    /// Mark a signature as seen.
    pub async fn record(&self, signature: &str) -> Result<()> {
        self.store.bf_add(&self.key, signature).await?;
        Ok(())
    }
}
