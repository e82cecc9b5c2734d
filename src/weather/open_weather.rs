use async_trait::async_trait;
use tracing::debug;

use super::{Coordinates, WeatherProvider};
use crate::config::WeatherConfig;
use crate::error::{Error, Result};

/// HTTP client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            units: units.into(),
        }
    }

    /// Build from config; the credential is required.
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Validation("weather.api_key is required".into()))?;
        Ok(Self::new(&config.endpoint, api_key, &config.units))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, at: Coordinates) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("units", self.units.clone()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "weather provider answered {}",
                status
            )));
        }

        let payload = response.json::<serde_json::Value>().await?;
        debug!(latitude = at.latitude, longitude = at.longitude, "weather fetched");
        Ok(payload)
    }
}
