//! Restaurant/review integration tests.
//!
//! Drives `RestaurantService` end to end over the in-memory store:
//! - restaurant creation, duplicate rejection and composite reads
//! - review submission, listing and deletion with aggregate rebalancing
//! - ranking, cuisine index, search, weather cache and detail documents
//! - partial failures of composite writes

mod cuisines;
mod ranking;
mod reviews;
mod weather;
#[cfg(feature = "openweather")]
mod open_weather;
