//! Restaurant records - scalar attributes and counters of one restaurant.

use std::collections::BTreeSet;
use std::sync::Arc;

use restaurant_kv_macros::HashRecord;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::new_id;
use crate::keys::{Key, Keyspace};
use crate::record::HashRecord;
use crate::store::KvStore;

pub(crate) const VIEW_COUNT: &str = "view_count";
pub(crate) const AVERAGE_RATING: &str = "average_rating";
pub(crate) const RATING_SUM: &str = "rating_sum";
pub(crate) const NAME: &str = "name";
pub(crate) const LOCATION: &str = "location";

/// A restaurant as stored in its record hash.
///
/// `cuisines` is a relationship owned by the cuisine index; it is not part of
/// the stored record and is filled in by composite reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, HashRecord)]
#[record(collection = "restaurants")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub location: String,
    pub view_count: u64,
    pub average_rating: f64,
    /// Sum of all review ratings, not a review count.
    pub rating_sum: i64,
    #[record(skip)]
    #[serde(default)]
    pub cuisines: BTreeSet<String>,
}

impl Restaurant {
    /// A fresh record with a newly allocated id and zeroed counters.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            location: location.into(),
            view_count: 0,
            average_rating: 0.0,
            rating_sum: 0,
            cuisines: BTreeSet::new(),
        }
    }

    /// Composite `name|location` key used by the duplicate detector.
    pub fn signature(&self) -> String {
        signature(&self.name, &self.location)
    }
}

pub(crate) fn signature(name: &str, location: &str) -> String {
    format!("{}|{}", name, location)
}

/// Validated restaurant submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub cuisines: Vec<String>,
}

impl NewRestaurant {
    pub fn new<I, T>(name: impl Into<String>, location: impl Into<String>, cuisines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            location: location.into(),
            cuisines: cuisines.into_iter().map(Into::into).collect(),
        }
    }

    /// Trimmed name and location plus the distinct, non-empty cuisine tags.
    pub(crate) fn normalize(&self) -> Result<(String, String, BTreeSet<String>)> {
        let name = self.name.trim();
        let location = self.location.trim();
        if name.is_empty() {
            return Err(Error::Validation("restaurant name is required".into()));
        }
        if location.is_empty() {
            return Err(Error::Validation("restaurant location is required".into()));
        }
        let cuisines = self
            .cuisines
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        Ok((name.to_string(), location.to_string(), cuisines))
    }
}

/// Record store for restaurants.
///
/// Counter updates are single atomic increments; nothing here reads before
/// writing a counter.
pub struct RestaurantStore<S> {
    store: Arc<S>,
    keys: Keyspace,
}

impl<S> Clone for RestaurantStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
        }
    }
}

impl<S: KvStore> RestaurantStore<S> {
    pub fn new(store: Arc<S>, keys: Keyspace) -> Self {
        Self { store, keys }
    }

    /// Write a freshly built record. One leg of the creation fan-out.
    pub async fn create(&self, restaurant: &Restaurant) -> Result<()> {
        let key = self.keys.key(Key::Restaurant(&restaurant.id));
        self.store.hset(&key, &restaurant.to_fields()).await?;
        Ok(())
    }

    /// Cheap existence probe.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.store.exists(&self.keys.key(Key::Restaurant(id))).await?)
    }

    pub(crate) async fn require(&self, id: &str) -> Result<()> {
        if self.exists(id).await? {
            Ok(())
        } else {
            Err(Error::not_found("restaurant", id))
        }
    }

    /// Read the stored record (without cuisines).
    pub async fn get(&self, id: &str) -> Result<Restaurant> {
        self.find(id)
            .await?
            .ok_or_else(|| Error::not_found("restaurant", id))
    }

    /// Like [`get`](Self::get) but `None` for an unknown id.
    pub async fn find(&self, id: &str) -> Result<Option<Restaurant>> {
        let fields = self
            .store
            .hget_all(&self.keys.key(Key::Restaurant(id)))
            .await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(Restaurant::from_fields(&fields)?))
    }

    pub(crate) async fn location(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .hget(&self.keys.key(Key::Restaurant(id)), LOCATION)
            .await?)
    }

    /// Atomically bump the view counter and return the new count.
    pub async fn increment_view_count(&self, id: &str) -> Result<u64> {
        self.require(id).await?;
        let count = self
            .store
            .hincr_by(&self.keys.key(Key::Restaurant(id)), VIEW_COUNT, 1)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Atomically add `delta` to the rating sum and return the new sum.
    pub async fn apply_review_delta(&self, id: &str, delta: i64) -> Result<i64> {
        self.require(id).await?;
        Ok(self
            .store
            .hincr_by(&self.keys.key(Key::Restaurant(id)), RATING_SUM, delta)
            .await?)
    }

    /// Overwrite the stored average.
    pub async fn set_average_rating(&self, id: &str, value: f64) -> Result<()> {
        self.store
            .hset(
                &self.keys.key(Key::Restaurant(id)),
                &[(AVERAGE_RATING.to_string(), value.to_string())],
            )
            .await?;
        Ok(())
    }
}
