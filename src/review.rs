//! Review store - per-restaurant review lists and review records.
//!
//! Adding or removing a review also drives the rating aggregation, so the list
//! length and the rating sum always move together.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::try_join_all;
use futures::try_join;
use futures::TryFutureExt;
use restaurant_kv_macros::HashRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::id::new_id;
use crate::keys::{Key, Keyspace};
use crate::rating::{RatingAggregator, RatingSnapshot};
use crate::record::HashRecord;
use crate::restaurant::RestaurantStore;
use crate::store::KvStore;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, HashRecord)]
#[record(collection = "reviews")]
pub struct Review {
    pub id: String,
    /// Back-reference to the owning restaurant; never changes.
    pub restaurant_id: String,
    pub rating: u8,
    pub body: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Review submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub rating: u8,
    pub body: String,
}

impl NewReview {
    pub fn new(rating: u8, body: impl Into<String>) -> Self {
        Self {
            rating,
            body: body.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(Error::Validation(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, self.rating
            )));
        }
        Ok(())
    }
}

/// Outcome of a review mutation: the review and the aggregate it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewChange {
    pub review: Review,
    pub rating: RatingSnapshot,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub struct ReviewStore<S> {
    store: Arc<S>,
    keys: Keyspace,
    records: RestaurantStore<S>,
    ratings: RatingAggregator<S>,
}

impl<S> Clone for ReviewStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            records: self.records.clone(),
            ratings: self.ratings.clone(),
        }
    }
}

impl<S: KvStore> ReviewStore<S> {
    pub fn new(store: Arc<S>, keys: Keyspace) -> Self {
        Self {
            records: RestaurantStore::new(Arc::clone(&store), keys.clone()),
            ratings: RatingAggregator::new(Arc::clone(&store), keys.clone()),
            store,
            keys,
        }
    }

    /// Prepend a new review and fold its rating into the aggregate.
    ///
    /// First batch: push the id (the returned length is the review count), add
    /// the rating to the sum, write the review record. Second batch: average to
    /// the record and the ranking. The caller has already probed the restaurant.
    pub async fn add(&self, restaurant_id: &str, input: &NewReview) -> Result<ReviewChange> {
        input.validate()?;
        let review = Review {
            id: new_id(),
            restaurant_id: restaurant_id.to_string(),
            rating: input.rating,
            body: input.body.clone(),
            timestamp: now_millis(),
        };

        let list_key = self.keys.key(Key::ReviewList(restaurant_id));
        let review_key = self.keys.key(Key::Review(&review.id));
        let fields = review.to_fields();

        let (review_count, rating_sum, ()) = try_join!(
            self.store.lpush(&list_key, &review.id).err_into::<Error>(),
            self.records
                .apply_review_delta(restaurant_id, i64::from(review.rating)),
            self.store.hset(&review_key, &fields).err_into::<Error>(),
        )?;
        debug!(restaurant_id, review_id = %review.id, review_count, rating_sum, "review stored");

        let rating = self
            .ratings
            .recompute(restaurant_id, rating_sum, review_count)
            .await?;
        Ok(ReviewChange { review, rating })
    }

    pub async fn get(&self, review_id: &str) -> Result<Option<Review>> {
        let fields = self
            .store
            .hget_all(&self.keys.key(Key::Review(review_id)))
            .await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(Review::from_fields(&fields)?))
    }

    /// Reviews at list positions `[offset, offset + limit)`, most recent first.
    ///
    /// Ids whose record no longer resolves are skipped instead of failing the page.
    pub async fn list(&self, restaurant_id: &str, offset: u64, limit: u64) -> Result<Vec<Review>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .store
            .lrange(
                &self.keys.key(Key::ReviewList(restaurant_id)),
                offset,
                offset.saturating_add(limit - 1),
            )
            .await?;

        let resolved = try_join_all(ids.iter().map(|id| self.resolve(id))).await?;
        Ok(resolved.into_iter().flatten().collect())
    }

    async fn resolve(&self, review_id: &str) -> Result<Option<Review>> {
        match self.get(review_id).await {
            Ok(Some(review)) => Ok(Some(review)),
            Ok(None) => {
                warn!(review_id, "review id listed without a record; skipping");
                Ok(None)
            }
            Err(Error::Record(err)) => {
                warn!(review_id, error = %err, "unreadable review record; skipping");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn count(&self, restaurant_id: &str) -> Result<u64> {
        Ok(self
            .store
            .llen(&self.keys.key(Key::ReviewList(restaurant_id)))
            .await?)
    }

    /// Remove a review and take its rating back out of the aggregate.
    ///
    /// The stored back-reference must match `restaurant_id`. Only the call that
    /// actually takes the id out of the list rebalances; a concurrent removal of
    /// the same review that finds it already gone is NotFound.
    pub async fn remove(&self, restaurant_id: &str, review_id: &str) -> Result<ReviewChange> {
        let review = self
            .get(review_id)
            .await?
            .ok_or_else(|| Error::not_found("review", review_id))?;

        if review.restaurant_id != restaurant_id {
            warn!(
                review_id,
                expected = restaurant_id,
                actual = %review.restaurant_id,
                "review belongs to another restaurant"
            );
            return Err(Error::IntegrityMismatch {
                review_id: review_id.to_string(),
                expected: restaurant_id.to_string(),
                actual: review.restaurant_id,
            });
        }

        let list_key = self.keys.key(Key::ReviewList(restaurant_id));
        let review_key = self.keys.key(Key::Review(review_id));

        let removed = self.store.lrem(&list_key, 1, review_id).await?;
        if removed == 0 {
            // a concurrent removal got to the list first and owns the rebalancing
            debug!(restaurant_id, review_id, "review already removed");
            return Err(Error::not_found("review", review_id));
        }

        let (_, rating_sum, review_count) = try_join!(
            self.store.delete(&review_key).err_into::<Error>(),
            self.records
                .apply_review_delta(restaurant_id, -i64::from(review.rating)),
            self.store.llen(&list_key).err_into::<Error>(),
        )?;
        debug!(restaurant_id, review_id, removed, review_count, rating_sum, "review removed");

        let rating = self
            .ratings
            .recompute(restaurant_id, rating_sum, review_count)
            .await?;
        Ok(ReviewChange { review, rating })
    }
}
