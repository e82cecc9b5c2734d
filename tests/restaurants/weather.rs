//! Weather lookups through the per-restaurant cache.

use std::sync::Arc;
use std::time::Duration;

use restaurant_kv::{
    Config, Coordinates, Error, ErrorKind, InMemoryStore, RestaurantService, WeatherProvider,
};
use serde_json::json;

use crate::support::{init_tracing, restaurant, StubWeather};

async fn service_with(
    provider: Option<Arc<StubWeather>>,
) -> RestaurantService<InMemoryStore> {
    init_tracing();
    let mut service =
        RestaurantService::new(Arc::new(InMemoryStore::new()), &Config::default()).unwrap();
    if let Some(provider) = provider {
        service = service.with_weather_provider(provider as Arc<dyn WeatherProvider>);
    }
    service.setup().await.unwrap();
    service
}

#[tokio::test(start_paused = true)]
async fn cached_until_the_ttl_runs_out() {
    let provider = StubWeather::answering(json!({ "main": { "temp": 71.2 } }));
    let service = service_with(Some(Arc::clone(&provider))).await;
    let created = restaurant(&service, "Rooftop", "-73.98,40.75").await;

    let first = service.weather(&created.id).await.unwrap();
    assert_eq!(first, json!({ "main": { "temp": 71.2 } }));
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        provider.last_coordinates(),
        Some(Coordinates {
            longitude: -73.98,
            latitude: 40.75
        })
    );

    tokio::time::advance(Duration::from_secs(30)).await;
    let second = service.weather(&created.id).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(provider.calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(service
        .weather_cache()
        .get(&created.id)
        .await
        .unwrap()
        .is_none());
    service.weather(&created.id).await.unwrap();
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn provider_failures_are_not_cached() {
    let provider = StubWeather::failing();
    let service = service_with(Some(Arc::clone(&provider))).await;
    let created = restaurant(&service, "Rooftop", "-73.98,40.75").await;

    for _ in 0..2 {
        let err = service.weather(&created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(err.status_code(), 503);
    }
    assert_eq!(provider.calls(), 2);
    assert!(service
        .weather_cache()
        .get(&created.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn location_without_coordinates_is_not_found() {
    let provider = StubWeather::answering(json!({}));
    let service = service_with(Some(Arc::clone(&provider))).await;
    let created = restaurant(&service, "Downtown Deli", "NY").await;

    let err = service.weather(&created.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "coordinates", .. }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn no_provider_is_upstream_unavailable() {
    let service = service_with(None).await;
    let created = restaurant(&service, "Rooftop", "-73.98,40.75").await;

    let err = service.weather(&created.id).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
}

#[tokio::test]
async fn cache_hit_skips_the_provider() {
    let provider = StubWeather::answering(json!({ "fresh": true }));
    let service = service_with(Some(Arc::clone(&provider))).await;
    let created = restaurant(&service, "Rooftop", "-73.98,40.75").await;

    service
        .weather_cache()
        .put(&created.id, &json!({ "cached": true }), Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(
        service.weather(&created.id).await.unwrap(),
        json!({ "cached": true })
    );
    assert_eq!(provider.calls(), 0);
}
