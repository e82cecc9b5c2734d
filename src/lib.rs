// Lets `#[derive(HashRecord)]` expand to `::restaurant_kv::...` inside this crate too.
extern crate self as restaurant_kv;

mod config;
mod cuisine;
mod details;
mod duplicate;
mod error;
#[cfg(feature = "emitter")]
mod events;
mod id;
mod keys;
mod page;
mod rating;
mod restaurant;
mod review;
mod search;
mod service;
mod weather;

pub mod record;
pub mod store;

pub use config::{
    Config, DuplicateFilterConfig, WeatherConfig, DEFAULT_NAMESPACE, DEFAULT_WEATHER_ENDPOINT,
};
pub use cuisine::CuisineIndex;
pub use details::DetailsStore;
pub use duplicate::DuplicateDetector;
pub use error::{Error, ErrorKind, Result};
#[cfg(feature = "emitter")]
pub use events::{ServiceEvents, RESTAURANT_CREATED, REVIEW_ADDED, REVIEW_REMOVED};
pub use id::new_id;
pub use keys::{Key, Keyspace};
pub use page::Page;
pub use rating::{average, round1, Ranked, RatingAggregator, RatingSnapshot};
pub use record::{HashRecord, RecordError};
pub use restaurant::{NewRestaurant, Restaurant, RestaurantStore};
pub use review::{NewReview, Review, ReviewChange, ReviewStore, MAX_RATING, MIN_RATING};
pub use search::SearchFacade;
pub use service::RestaurantService;
pub use store::{InMemoryStore, KvStore, StoreError};
#[cfg(feature = "openweather")]
pub use weather::OpenWeatherClient;
pub use weather::{Coordinates, WeatherCache, WeatherProvider};

// Derive macro shares the trait's name, like serde's `Serialize`.
pub use restaurant_kv_macros::HashRecord;
