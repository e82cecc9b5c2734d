//! Key namespace - maps (entity kind, identifier) to a physical store key.
//!
//! Every key is `"{namespace}:{segment}"` or `"{namespace}:{segment}:{id}"`.
//! Segments are fixed per kind and the identifier is appended verbatim, so two
//! distinct `(kind, id)` pairs never produce the same key.

use std::fmt;
use std::sync::Arc;

/// One logical structure in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key<'a> {
    /// Restaurant record (hash).
    Restaurant(&'a str),
    /// Per-restaurant review-id list, most recent first.
    ReviewList(&'a str),
    /// Per-review record (hash).
    Review(&'a str),
    /// Global set of cuisine tags.
    Cuisines,
    /// Per-cuisine set of restaurant ids.
    Cuisine(&'a str),
    /// Per-restaurant set of cuisine tags.
    RestaurantCuisines(&'a str),
    /// Global rating-ranked sorted set.
    RatingRanking,
    /// Per-restaurant weather cache entry (expiring string).
    Weather(&'a str),
    /// Per-restaurant free-form details document.
    Details(&'a str),
    /// The duplicate-detector filter.
    DuplicateFilter,
    /// The text index over restaurant records.
    SearchIndex,
}

impl Key<'_> {
    fn segment(&self) -> &'static str {
        match self {
            Key::Restaurant(_) => "restaurants",
            Key::ReviewList(_) => "reviews",
            Key::Review(_) => "review_details",
            Key::Cuisines => "cuisines",
            Key::Cuisine(_) => "cuisine",
            Key::RestaurantCuisines(_) => "restaurant_cuisines",
            Key::RatingRanking => "restaurants_by_rating",
            Key::Weather(_) => "weather",
            Key::Details(_) => "restaurant_details",
            Key::DuplicateFilter => "bloom_restaurants",
            Key::SearchIndex => "idx_restaurants",
        }
    }

    fn id(&self) -> Option<&str> {
        match *self {
            Key::Restaurant(id)
            | Key::ReviewList(id)
            | Key::Review(id)
            | Key::Cuisine(id)
            | Key::RestaurantCuisines(id)
            | Key::Weather(id)
            | Key::Details(id) => Some(id),
            Key::Cuisines | Key::RatingRanking | Key::DuplicateFilter | Key::SearchIndex => None,
        }
    }
}

/// Deterministic key builder scoped to one namespace.
///
/// Cheap to clone; every component holds its own copy.
#[derive(Clone, PartialEq, Eq)]
pub struct Keyspace {
    namespace: Arc<str>,
}

impl Keyspace {
    pub fn new(namespace: impl AsRef<str>) -> Self {
        Self {
            namespace: Arc::from(namespace.as_ref()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build the physical key for `key`.
    pub fn key(&self, key: Key<'_>) -> String {
        match key.id() {
            Some(id) => format!("{}:{}:{}", self.namespace, key.segment(), id),
            None => format!("{}:{}", self.namespace, key.segment()),
        }
    }

    /// Prefix shared by every restaurant record key; the text index watches it.
    pub fn restaurant_prefix(&self) -> String {
        format!("{}:{}:", self.namespace, Key::Restaurant("").segment())
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new("bites")
    }
}

impl fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keyspace").field(&self.namespace).finish()
    }
}
