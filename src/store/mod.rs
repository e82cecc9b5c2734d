//! Store client seam - the key-value primitives the core is allowed to use.
//!
//! Every method is individually atomic on its key. Nothing here spans keys; the
//! composite operations built on top are sagas, not transactions.
//!
//! ## Example
//!
//! ```ignore
//! use restaurant_kv::{InMemoryStore, KvStore};
//!
//! let store = InMemoryStore::new();
//! store.lpush("bites:reviews:r1", "v1").await?;
//! let count = store.llen("bites:reviews:r1").await?;
//! ```

mod bloom;
mod in_memory;
mod sorted_set;

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bloom::BloomFilter;
pub use in_memory::InMemoryStore;

/// Errors returned by a store backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The key holds a different structure than the command expects.
    #[error("key {key} holds the wrong kind of value")]
    WrongType { key: String },

    /// Increment on a hash field that is not an integer.
    #[error("field {field} of {key} is not an integer")]
    NotAnInteger { key: String, field: String },

    #[error("unknown index: {0}")]
    NoSuchIndex(String),

    #[error("index already exists: {0}")]
    IndexExists(String),

    /// A filter was reserved twice.
    #[error("filter already exists: {0}")]
    FilterExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The in-process lock was poisoned by a panicking writer.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// The backend could not be reached or failed the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Kind of a declared text-index attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free text, tokenized into words.
    Text,
    /// Number; `sortable` fields can order search results.
    Numeric { sortable: bool },
}

/// One searchable attribute of the indexed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// Declares which hash records the text index watches and what it indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    /// Key prefixes of the hash records to index.
    pub prefixes: Vec<String>,
    pub schema: Vec<SchemaField>,
}

impl IndexDefinition {
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.schema.iter().find(|f| f.name == name)
    }
}

/// Prefix query over one TEXT field.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub field: String,
    pub prefix: String,
    /// Sort descending by this SORTABLE numeric field; key order otherwise.
    pub sort_desc_by: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

/// A matched record: its key and stored fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub key: String,
    pub fields: HashMap<String, String>,
}

/// Abstract key-value store offering the structures the core denormalizes into.
///
/// Implementations talk to a real server; [`InMemoryStore`] is the in-process
/// reference used for tests and embedding.
#[async_trait]
pub trait KvStore: Send + Sync {
    // ------------------------------------------------------------------
    // keys
    // ------------------------------------------------------------------

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete a key of any kind. Returns true if it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // hashes
    // ------------------------------------------------------------------

    /// Set fields, creating the hash if needed.
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// All fields; empty when the key is absent.
    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Atomically add `delta` to an integer field (absent counts as 0).
    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    // ------------------------------------------------------------------
    // lists
    // ------------------------------------------------------------------

    /// Prepend a value. Returns the list length after the push.
    async fn lpush(&self, key: &str, value: &str) -> Result<u64, StoreError>;

    /// Elements in `[start, stop]` (inclusive, zero-based).
    async fn lrange(&self, key: &str, start: u64, stop: u64) -> Result<Vec<String>, StoreError>;

    /// Remove up to `count` occurrences of `value` from the head. Returns how many went.
    async fn lrem(&self, key: &str, count: u64, value: &str) -> Result<u64, StoreError>;

    async fn llen(&self, key: &str) -> Result<u64, StoreError>;

    // ------------------------------------------------------------------
    // sets
    // ------------------------------------------------------------------

    /// Returns true if the member was newly added.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, StoreError>;

    // ------------------------------------------------------------------
    // sorted sets
    // ------------------------------------------------------------------

    /// Insert or re-score a member.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError>;

    /// Members by descending score, ranks `[start, stop]` inclusive.
    async fn zrevrange(
        &self,
        key: &str,
        start: u64,
        stop: u64,
    ) -> Result<Vec<(String, f64)>, StoreError>;

    // ------------------------------------------------------------------
    // expiring strings
    // ------------------------------------------------------------------

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    // ------------------------------------------------------------------
    // JSON documents
    // ------------------------------------------------------------------

    async fn json_set(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError>;

    async fn json_get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    // ------------------------------------------------------------------
    // approximate membership
    // ------------------------------------------------------------------

    /// Create a filter. Fails with [`StoreError::FilterExists`] if present.
    async fn bf_reserve(&self, key: &str, error_rate: f64, capacity: u64)
        -> Result<(), StoreError>;

    /// Returns true if the item was (probably) not present before.
    async fn bf_add(&self, key: &str, item: &str) -> Result<bool, StoreError>;

    async fn bf_exists(&self, key: &str, item: &str) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // text index
    // ------------------------------------------------------------------

    /// Fails with [`StoreError::IndexExists`] if an index of that name exists.
    async fn ft_create(&self, definition: &IndexDefinition) -> Result<(), StoreError>;

    async fn ft_search(&self, index: &str, query: &SearchQuery)
        -> Result<Vec<SearchHit>, StoreError>;
}
