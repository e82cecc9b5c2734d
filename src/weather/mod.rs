//! Weather cache - short-lived cache of a third-party weather lookup per restaurant.
//!
//! Entries expire on their own; an expired entry reads as a miss. Provider
//! failures are never cached.

#[cfg(feature = "openweather")]
mod open_weather;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::keys::{Key, Keyspace};
use crate::store::KvStore;

#[cfg(feature = "openweather")]
pub use open_weather::OpenWeatherClient;

/// A point parsed from a restaurant's `"longitude,latitude"` location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Parse `"lng,lat"`. Anything else (a city name, out-of-range values) is `None`.
    pub fn parse(location: &str) -> Option<Self> {
        let (lng, lat) = location.split_once(',')?;
        let longitude: f64 = lng.trim().parse().ok()?;
        let latitude: f64 = lat.trim().parse().ok()?;
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return None;
        }
        Some(Self {
            longitude,
            latitude,
        })
    }
}

/// Source of current weather conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions at `at`. Non-success answers are upstream errors.
    async fn current(&self, at: Coordinates) -> Result<serde_json::Value>;
}

pub struct WeatherCache<S> {
    store: Arc<S>,
    keys: Keyspace,
    ttl: Duration,
}

impl<S> Clone for WeatherCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            ttl: self.ttl,
        }
    }
}

impl<S: KvStore> WeatherCache<S> {
    pub fn new(store: Arc<S>, keys: Keyspace, ttl: Duration) -> Self {
        Self { store, keys, ttl }
    }

    /// Default expiry applied by [`put_default`](Self::put_default).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached payload, or `None` on a miss (never stored, expired, or unreadable).
    pub async fn get(&self, restaurant_id: &str) -> Result<Option<serde_json::Value>> {
        let Some(raw) = self
            .store
            .get(&self.keys.key(Key::Weather(restaurant_id)))
            .await?
        else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => {
                warn!(restaurant_id, error = %err, "unreadable weather cache entry; treating as miss");
                Ok(None)
            }
        }
    }

    pub async fn put(
        &self,
        restaurant_id: &str,
        payload: &serde_json::Value,
        ttl: Duration,
    ) -> Result<()> {
        self.store
            .set_ex(
                &self.keys.key(Key::Weather(restaurant_id)),
                &payload.to_string(),
                ttl,
            )
            .await?;
        Ok(())
    }

    pub async fn put_default(&self, restaurant_id: &str, payload: &serde_json::Value) -> Result<()> {
        self.put(restaurant_id, payload, self.ttl).await
    }
}
