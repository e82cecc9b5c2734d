//! InMemoryStore - HashMap-backed store for testing and development.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::bloom::BloomFilter;
use super::sorted_set::SortedSet;
use super::{
    FieldKind, IndexDefinition, KvStore, SearchHit, SearchQuery, StoreError,
};

const DEFAULT_FILTER_RATE: f64 = 0.01;
const DEFAULT_FILTER_CAPACITY: u64 = 100;

enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
    Sorted(SortedSet),
    Bloom(BloomFilter),
    Json(serde_json::Value),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Default)]
struct State {
    data: HashMap<String, Entry>,
    indexes: HashMap<String, IndexDefinition>,
}

impl State {
    fn live(&self, key: &str) -> Option<&Value> {
        let now = Instant::now();
        self.data
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| &entry.value)
    }

    fn purge_if_expired(&mut self, key: &str) {
        let now = Instant::now();
        if self.data.get(key).is_some_and(|entry| !entry.is_live(now)) {
            self.data.remove(key);
        }
    }

    fn live_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.purge_if_expired(key);
        self.data.get_mut(key).map(|entry| &mut entry.value)
    }

    fn get_or_insert(&mut self, key: &str, make: impl FnOnce() -> Value) -> &mut Value {
        self.purge_if_expired(key);
        &mut self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(make()))
            .value
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

/// In-memory store backed by a HashMap of typed entries.
///
/// Expiry is checked lazily on access against `tokio::time::Instant`, so paused
/// test clocks apply. Clone-friendly via Arc; clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, StoreError> {
        let state = self.read("len")?;
        let now = Instant::now();
        Ok(state.data.values().filter(|e| e.is_live(now)).count())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Live keys, sorted. Handy for asserting a write touched nothing.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let state = self.read("keys")?;
        let now = Instant::now();
        let mut keys: Vec<String> = state
            .data
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read("exists")?.live(key).is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut state = self.write("delete")?;
        state.purge_if_expired(key);
        Ok(state.data.remove(key).is_some())
    }

    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut state = self.write("hset")?;
        match state.get_or_insert(key, || Value::Hash(HashMap::new())) {
            Value::Hash(hash) => {
                hash.extend(fields.iter().cloned());
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        match self.read("hget")?.live(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        match self.read("hget_all")?.live(key) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut state = self.write("hincr_by")?;
        let hash = match state.get_or_insert(key, || Value::Hash(HashMap::new())) {
            Value::Hash(hash) => hash,
            _ => return Err(wrong_type(key)),
        };

        let current = match hash.get(field) {
            None => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::NotAnInteger {
                key: key.to_string(),
                field: field.to_string(),
            })?,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::InvalidArgument("increment overflows i64".into()))?;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<u64, StoreError> {
        let mut state = self.write("lpush")?;
        match state.get_or_insert(key, || Value::List(VecDeque::new())) {
            Value::List(list) => {
                list.push_front(value.to_string());
                Ok(list.len() as u64)
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn lrange(&self, key: &str, start: u64, stop: u64) -> Result<Vec<String>, StoreError> {
        match self.read("lrange")?.live(key) {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => {
                if stop < start {
                    return Ok(Vec::new());
                }
                Ok(list
                    .iter()
                    .skip(start as usize)
                    .take((stop - start).saturating_add(1) as usize)
                    .cloned()
                    .collect())
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn lrem(&self, key: &str, count: u64, value: &str) -> Result<u64, StoreError> {
        let mut state = self.write("lrem")?;
        let (removed, now_empty) = match state.live_mut(key) {
            None => return Ok(0),
            Some(Value::List(list)) => {
                let mut removed = 0u64;
                list.retain(|item| {
                    if removed < count && item == value {
                        removed += 1;
                        false
                    } else {
                        true
                    }
                });
                (removed, list.is_empty())
            }
            Some(_) => return Err(wrong_type(key)),
        };
        if now_empty {
            state.data.remove(key);
        }
        Ok(removed)
    }

    async fn llen(&self, key: &str) -> Result<u64, StoreError> {
        match self.read("llen")?.live(key) {
            None => Ok(0),
            Some(Value::List(list)) => Ok(list.len() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self.write("sadd")?;
        match state.get_or_insert(key, || Value::Set(BTreeSet::new())) {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        match self.read("smembers")?.live(key) {
            None => Ok(BTreeSet::new()),
            Some(Value::Set(set)) => Ok(set.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        if score.is_nan() {
            return Err(StoreError::InvalidArgument("score is not a number".into()));
        }
        let mut state = self.write("zadd")?;
        match state.get_or_insert(key, || Value::Sorted(SortedSet::default())) {
            Value::Sorted(set) => {
                set.insert(member, score);
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        match self.read("zscore")?.live(key) {
            None => Ok(None),
            Some(Value::Sorted(set)) => Ok(set.score(member)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn zrevrange(
        &self,
        key: &str,
        start: u64,
        stop: u64,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        match self.read("zrevrange")?.live(key) {
            None => Ok(Vec::new()),
            Some(Value::Sorted(set)) => Ok(set.rev_range(start, stop)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidArgument("expiry must be positive".into()));
        }
        let mut state = self.write("set_ex")?;
        state.data.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.read("get")?.live(key) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn json_set(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        let mut state = self.write("json_set")?;
        state.purge_if_expired(key);
        match state.data.get_mut(key) {
            Some(Entry {
                value: Value::Json(doc),
                ..
            }) => *doc = value.clone(),
            Some(_) => return Err(wrong_type(key)),
            None => {
                state
                    .data
                    .insert(key.to_string(), Entry::new(Value::Json(value.clone())));
            }
        }
        Ok(())
    }

    async fn json_get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        match self.read("json_get")?.live(key) {
            None => Ok(None),
            Some(Value::Json(doc)) => Ok(Some(doc.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn bf_reserve(
        &self,
        key: &str,
        error_rate: f64,
        capacity: u64,
    ) -> Result<(), StoreError> {
        if !(error_rate > 0.0 && error_rate < 1.0) || capacity == 0 {
            return Err(StoreError::InvalidArgument(format!(
                "bloom filter needs 0 < error_rate < 1 and capacity > 0 (got {}, {})",
                error_rate, capacity
            )));
        }
        let mut state = self.write("bf_reserve")?;
        if state.live(key).is_some() {
            return Err(StoreError::FilterExists(key.to_string()));
        }
        state.data.insert(
            key.to_string(),
            Entry::new(Value::Bloom(BloomFilter::with_rate(error_rate, capacity))),
        );
        Ok(())
    }

    async fn bf_add(&self, key: &str, item: &str) -> Result<bool, StoreError> {
        let mut state = self.write("bf_add")?;
        match state.get_or_insert(key, || {
            Value::Bloom(BloomFilter::with_rate(
                DEFAULT_FILTER_RATE,
                DEFAULT_FILTER_CAPACITY,
            ))
        }) {
            Value::Bloom(filter) => Ok(filter.insert(item)),
            _ => Err(wrong_type(key)),
        }
    }

    async fn bf_exists(&self, key: &str, item: &str) -> Result<bool, StoreError> {
        match self.read("bf_exists")?.live(key) {
            None => Ok(false),
            Some(Value::Bloom(filter)) => Ok(filter.contains(item)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn ft_create(&self, definition: &IndexDefinition) -> Result<(), StoreError> {
        let mut state = self.write("ft_create")?;
        if state.indexes.contains_key(&definition.name) {
            return Err(StoreError::IndexExists(definition.name.clone()));
        }
        state
            .indexes
            .insert(definition.name.clone(), definition.clone());
        Ok(())
    }

    async fn ft_search(
        &self,
        index: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let state = self.read("ft_search")?;
        let definition = state
            .indexes
            .get(index)
            .ok_or_else(|| StoreError::NoSuchIndex(index.to_string()))?;

        match definition.field(&query.field) {
            Some(field) if field.kind == FieldKind::Text => {}
            _ => {
                return Err(StoreError::InvalidArgument(format!(
                    "{} is not a TEXT field of {}",
                    query.field, index
                )))
            }
        }
        if let Some(sort_field) = &query.sort_desc_by {
            match definition.field(sort_field) {
                Some(field) if field.kind == (FieldKind::Numeric { sortable: true }) => {}
                _ => {
                    return Err(StoreError::InvalidArgument(format!(
                        "{} is not a SORTABLE field of {}",
                        sort_field, index
                    )))
                }
            }
        }

        let prefix = query.prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Err(StoreError::InvalidArgument("empty search prefix".into()));
        }

        let now = Instant::now();
        let mut hits: Vec<SearchHit> = state
            .data
            .iter()
            .filter(|(key, entry)| {
                entry.is_live(now) && definition.prefixes.iter().any(|p| key.starts_with(p))
            })
            .filter_map(|(key, entry)| match &entry.value {
                Value::Hash(fields) => Some((key, fields)),
                _ => None,
            })
            .filter(|(_, fields)| {
                fields
                    .get(&query.field)
                    .is_some_and(|text| words(text).any(|word| word.starts_with(&prefix)))
            })
            .map(|(key, fields)| SearchHit {
                key: key.clone(),
                fields: fields.clone(),
            })
            .collect();

        match &query.sort_desc_by {
            Some(sort_field) => {
                let numeric = |hit: &SearchHit| {
                    hit.fields
                        .get(sort_field)
                        .and_then(|v| v.parse::<f64>().ok())
                        .unwrap_or(f64::NEG_INFINITY)
                };
                hits.sort_by(|a, b| {
                    numeric(b)
                        .total_cmp(&numeric(a))
                        .then_with(|| a.key.cmp(&b.key))
                });
            }
            None => hits.sort_by(|a, b| a.key.cmp(&b.key)),
        }

        Ok(hits
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

/// Lowercased alphanumeric words of a TEXT field.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
}
