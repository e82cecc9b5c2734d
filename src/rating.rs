//! Rating aggregation and the rating-ranked ordering of restaurants.
//!
//! The average is never drifted: every mutation re-derives it from the rating sum
//! and the current length of the review list, then writes it to the record and
//! the ranking in one parallel batch.

use std::sync::Arc;

use futures::try_join;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::keys::{Key, Keyspace};
use crate::restaurant::RestaurantStore;
use crate::store::KvStore;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `round1(sum / count)`, or 0 when there are no reviews.
pub fn average(sum: i64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round1(sum as f64 / count as f64)
}

/// Aggregate state after a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub rating_sum: i64,
    pub review_count: u64,
    pub average_rating: f64,
}

/// One entry of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub restaurant_id: String,
    pub score: f64,
}

pub struct RatingAggregator<S> {
    store: Arc<S>,
    keys: Keyspace,
    records: RestaurantStore<S>,
}

impl<S> Clone for RatingAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            records: self.records.clone(),
        }
    }
}

impl<S: KvStore> RatingAggregator<S> {
    pub fn new(store: Arc<S>, keys: Keyspace) -> Self {
        let records = RestaurantStore::new(Arc::clone(&store), keys.clone());
        Self {
            store,
            keys,
            records,
        }
    }

    /// Zero-score ranking entry for a new restaurant.
    pub async fn seed(&self, restaurant_id: &str) -> Result<()> {
        self.set_score(restaurant_id, 0.0).await
    }

    async fn set_score(&self, restaurant_id: &str, score: f64) -> Result<()> {
        self.store
            .zadd(&self.keys.key(Key::RatingRanking), restaurant_id, score)
            .await?;
        Ok(())
    }

    /// Derive the average from `rating_sum` and `review_count`, then write it to
    /// the record and the ranking in parallel.
    pub async fn recompute(
        &self,
        restaurant_id: &str,
        rating_sum: i64,
        review_count: u64,
    ) -> Result<RatingSnapshot> {
        let average_rating = average(rating_sum, review_count);
        try_join!(
            self.records.set_average_rating(restaurant_id, average_rating),
            self.set_score(restaurant_id, average_rating),
        )?;

        debug!(
            restaurant_id,
            rating_sum, review_count, average_rating, "rating recomputed"
        );
        Ok(RatingSnapshot {
            rating_sum,
            review_count,
            average_rating,
        })
    }

    /// Ids by descending score; ties keep their ranking insertion order.
    pub async fn top_by_rating(&self, offset: u64, limit: u64) -> Result<Vec<Ranked>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .zrevrange(
                &self.keys.key(Key::RatingRanking),
                offset,
                offset.saturating_add(limit - 1),
            )
            .await?;
        Ok(entries
            .into_iter()
            .map(|(restaurant_id, score)| Ranked {
                restaurant_id,
                score,
            })
            .collect())
    }

    pub async fn score(&self, restaurant_id: &str) -> Result<Option<f64>> {
        Ok(self
            .store
            .zscore(&self.keys.key(Key::RatingRanking), restaurant_id)
            .await?)
    }
}
