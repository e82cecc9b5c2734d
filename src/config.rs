//! Configuration consumed by the core.
//!
//! Loading (files, environment) belongs to the embedding process; the core only
//! deserializes and validates.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "namespace": "bites",
//!   "duplicates": { "error_rate": 0.0001, "capacity": 1000000 },
//!   "weather": { "api_key": "...", "cache_ttl_secs": 60 }
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_NAMESPACE: &str = "bites";
pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of every key the core writes.
    pub namespace: String,

    pub duplicates: DuplicateFilterConfig,

    pub weather: WeatherConfig,

    /// Upper bound for `limit` on paginated reads.
    pub max_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            duplicates: DuplicateFilterConfig::default(),
            weather: WeatherConfig::default(),
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || self.namespace.contains(':') {
            return Err(Error::Validation(format!(
                "namespace must be non-empty and contain no ':' (got {:?})",
                self.namespace
            )));
        }
        if self.max_page_size == 0 {
            return Err(Error::Validation("max_page_size must be positive".into()));
        }
        self.duplicates.validate()?;
        self.weather.validate()
    }
}

/// Sizing of the approximate-membership filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateFilterConfig {
    /// Target false-positive rate, strictly between 0 and 1.
    pub error_rate: f64,

    /// Expected number of distinct signatures.
    pub capacity: u64,
}

impl Default for DuplicateFilterConfig {
    fn default() -> Self {
        Self {
            error_rate: 0.0001,
            capacity: 1_000_000,
        }
    }
}

impl DuplicateFilterConfig {
    fn validate(&self) -> Result<()> {
        if !(self.error_rate > 0.0 && self.error_rate < 1.0) {
            return Err(Error::Validation(format!(
                "duplicates.error_rate must be in (0, 1), got {}",
                self.error_rate
            )));
        }
        if self.capacity == 0 {
            return Err(Error::Validation("duplicates.capacity must be positive".into()));
        }
        Ok(())
    }
}

/// Weather provider endpoint, credential and cache expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub endpoint: String,

    pub api_key: Option<String>,

    /// Unit system passed to the provider.
    pub units: String,

    pub cache_ttl_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            api_key: None,
            units: "imperial".to_string(),
            cache_ttl_secs: 60,
        }
    }
}

impl WeatherConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(Error::Validation("weather.cache_ttl_secs must be positive".into()));
        }
        if self.endpoint.is_empty() {
            return Err(Error::Validation("weather.endpoint must be set".into()));
        }
        Ok(())
    }
}
