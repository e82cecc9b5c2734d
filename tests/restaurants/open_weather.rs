//! OpenWeather binding against a local stub server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use restaurant_kv::{
    Config, Coordinates, ErrorKind, InMemoryStore, OpenWeatherClient, RestaurantService,
    WeatherConfig, WeatherProvider,
};
use serde_json::{json, Value};

use crate::support::{init_tracing, restaurant};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Bind to port 0 and return the endpoint URL.
async fn start_server(status: StatusCode, seen: Seen) -> String {
    let app = Router::new()
        .route(
            "/data/2.5/weather",
            get(
                |State((status, seen)): State<(StatusCode, Seen)>,
                 Query(params): Query<HashMap<String, String>>| async move {
                    seen.lock().unwrap().push(params);
                    (status, Json(json!({ "main": { "temp": 64.0 }, "name": "Stub" })))
                },
            ),
        )
        .with_state((status, seen));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/data/2.5/weather")
}

#[tokio::test]
async fn sends_coordinates_units_and_key() {
    init_tracing();
    let seen = Seen::default();
    let endpoint = start_server(StatusCode::OK, Arc::clone(&seen)).await;
    let client = OpenWeatherClient::new(endpoint, "secret", "imperial");

    let payload = client
        .current(Coordinates {
            longitude: -73.98,
            latitude: 40.75,
        })
        .await
        .unwrap();
    assert_eq!(payload["name"], "Stub");

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params["lat"], "40.75");
    assert_eq!(params["lon"], "-73.98");
    assert_eq!(params["units"], "imperial");
    assert_eq!(params["appid"], "secret");
}

#[tokio::test]
async fn error_status_is_upstream_unavailable() {
    let seen = Seen::default();
    let endpoint = start_server(StatusCode::UNAUTHORIZED, Arc::clone(&seen)).await;
    let client = OpenWeatherClient::new(endpoint, "wrong", "metric");

    let err = client
        .current(Coordinates {
            longitude: 0.0,
            latitude: 0.0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn unreachable_endpoint_is_upstream_unavailable() {
    // bind then drop so nothing listens on the port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OpenWeatherClient::new(format!("http://{addr}/weather"), "k", "metric");
    let err = client
        .current(Coordinates {
            longitude: 1.0,
            latitude: 1.0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[test]
fn config_requires_an_api_key() {
    let err = OpenWeatherClient::from_config(&WeatherConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let config = WeatherConfig {
        api_key: Some("k".into()),
        ..WeatherConfig::default()
    };
    assert!(OpenWeatherClient::from_config(&config).is_ok());
}

#[tokio::test]
async fn service_caches_the_http_answer() {
    init_tracing();
    let seen = Seen::default();
    let endpoint = start_server(StatusCode::OK, Arc::clone(&seen)).await;
    let config = Config {
        weather: WeatherConfig {
            endpoint,
            api_key: Some("secret".into()),
            ..WeatherConfig::default()
        },
        ..Config::default()
    };
    let client = OpenWeatherClient::from_config(&config.weather).unwrap();
    let service = RestaurantService::new(Arc::new(InMemoryStore::new()), &config)
        .unwrap()
        .with_weather_provider(Arc::new(client));
    service.setup().await.unwrap();
    let created = restaurant(&service, "Harbor Grill", "-122.42,37.77").await;

    let first: Value = service.weather(&created.id).await.unwrap();
    let second: Value = service.weather(&created.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(seen.lock().unwrap().len(), 1);
}
