//! Restaurant orchestration.
//!
//! Every composite operation is a saga over independently atomic store calls:
//! one parallel batch, and a second one where a value from the first is needed.
//! A failed leg fails the whole operation; legs that already applied stay
//! applied.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use futures::try_join;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::cuisine::CuisineIndex;
use crate::details::DetailsStore;
use crate::duplicate::DuplicateDetector;
use crate::error::{Error, Result};
use crate::keys::Keyspace;
use crate::page::Page;
use crate::rating::RatingAggregator;
use crate::restaurant::{signature, NewRestaurant, Restaurant, RestaurantStore};
use crate::review::{NewReview, Review, ReviewChange, ReviewStore};
use crate::search::SearchFacade;
use crate::store::KvStore;
use crate::weather::{Coordinates, WeatherCache, WeatherProvider};

#[cfg(feature = "emitter")]
use crate::events::{ServiceEvents, RESTAURANT_CREATED, REVIEW_ADDED, REVIEW_REMOVED};

/// Entry point for the restaurant/review domain.
///
/// All components share the one injected store handle.
///
/// ## Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let service = RestaurantService::new(store, &Config::default())?;
/// service.setup().await?;
///
/// let pizza = service
///     .create_restaurant(NewRestaurant::new("Pizza Palace", "NY", ["Italian", "Pizza"]))
///     .await?;
/// service.add_review(&pizza.id, NewReview::new(5, "great crust")).await?;
/// ```
pub struct RestaurantService<S> {
    config: Config,
    keys: Keyspace,
    records: RestaurantStore<S>,
    cuisines: CuisineIndex<S>,
    ratings: RatingAggregator<S>,
    reviews: ReviewStore<S>,
    duplicates: DuplicateDetector<S>,
    search: SearchFacade<S>,
    weather: WeatherCache<S>,
    details: DetailsStore<S>,
    provider: Option<Arc<dyn WeatherProvider>>,
    #[cfg(feature = "emitter")]
    events: ServiceEvents,
}

impl<S: KvStore> RestaurantService<S> {
    pub fn new(store: Arc<S>, config: &Config) -> Result<Self> {
        config.validate()?;
        let keys = Keyspace::new(&config.namespace);

        Ok(Self {
            records: RestaurantStore::new(Arc::clone(&store), keys.clone()),
            cuisines: CuisineIndex::new(Arc::clone(&store), keys.clone()),
            ratings: RatingAggregator::new(Arc::clone(&store), keys.clone()),
            reviews: ReviewStore::new(Arc::clone(&store), keys.clone()),
            duplicates: DuplicateDetector::new(
                Arc::clone(&store),
                &keys,
                config.duplicates.clone(),
            ),
            search: SearchFacade::new(Arc::clone(&store), &keys),
            weather: WeatherCache::new(
                Arc::clone(&store),
                keys.clone(),
                config.weather.cache_ttl(),
            ),
            details: DetailsStore::new(store, keys.clone()),
            provider: None,
            #[cfg(feature = "emitter")]
            events: ServiceEvents::new(),
            config: config.clone(),
            keys,
        })
    }

    /// Use `provider` for weather cache misses.
    pub fn with_weather_provider(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keys(&self) -> &Keyspace {
        &self.keys
    }

    pub fn records(&self) -> &RestaurantStore<S> {
        &self.records
    }

    pub fn cuisine_index(&self) -> &CuisineIndex<S> {
        &self.cuisines
    }

    pub fn ratings(&self) -> &RatingAggregator<S> {
        &self.ratings
    }

    pub fn reviews(&self) -> &ReviewStore<S> {
        &self.reviews
    }

    pub fn duplicates(&self) -> &DuplicateDetector<S> {
        &self.duplicates
    }

    pub fn search_facade(&self) -> &SearchFacade<S> {
        &self.search
    }

    pub fn weather_cache(&self) -> &WeatherCache<S> {
        &self.weather
    }

    /// Register a listener for `RestaurantCreated`, `ReviewAdded` or `ReviewRemoved`.
    #[cfg(feature = "emitter")]
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.events.on(event, listener);
    }

    /// One-time environment setup: reserve the duplicate filter and build the
    /// search index. Safe to run again.
    #[instrument(skip(self))]
    pub async fn setup(&self) -> Result<()> {
        try_join!(self.duplicates.reserve(), self.search.ensure_index())?;
        info!(namespace = %self.keys.namespace(), "environment ready");
        Ok(())
    }

    /// Create a restaurant with its cuisine tags.
    ///
    /// A probable duplicate is rejected before anything is written. Otherwise the
    /// record, the cuisine index, the zero ranking entry and the signature are
    /// written in one parallel batch.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_restaurant(&self, input: NewRestaurant) -> Result<Restaurant> {
        let (name, location, tags) = input.normalize()?;
        let signature = signature(&name, &location);

        if self.duplicates.probably_exists(&signature).await? {
            warn!(%signature, "duplicate restaurant rejected");
            return Err(Error::Conflict { signature });
        }

        let mut restaurant = Restaurant::new(name, location);
        try_join!(
            self.records.create(&restaurant),
            self.cuisines.attach(&restaurant.id, &tags),
            self.ratings.seed(&restaurant.id),
            self.duplicates.record(&signature),
        )?;
        restaurant.cuisines = tags;

        info!(restaurant_id = %restaurant.id, "restaurant created");
        #[cfg(feature = "emitter")]
        self.events.emit(RESTAURANT_CREATED, &restaurant);
        Ok(restaurant)
    }

    /// Composite read. Counts as a view: the returned record carries the
    /// incremented view count.
    #[instrument(skip(self))]
    pub async fn get_restaurant(&self, id: &str) -> Result<Restaurant> {
        self.records.require(id).await?;

        let (view_count, mut restaurant, cuisines) = try_join!(
            self.records.increment_view_count(id),
            self.records.get(id),
            self.cuisines.tags_of(id),
        )?;
        restaurant.view_count = view_count;
        restaurant.cuisines = cuisines;
        Ok(restaurant)
    }

    /// Restaurants by descending average rating. Ids that no longer resolve to a
    /// record are left out of the page.
    #[instrument(skip(self))]
    pub async fn top_restaurants(&self, page: Page) -> Result<Vec<Restaurant>> {
        page.validate(self.config.max_page_size)?;
        let ranked = self
            .ratings
            .top_by_rating(page.offset(), u64::from(page.limit))
            .await?;

        let resolved = try_join_all(ranked.iter().map(|entry| self.resolve(&entry.restaurant_id)))
            .await?;
        Ok(resolved.into_iter().flatten().collect())
    }

    async fn resolve(&self, id: &str) -> Result<Option<Restaurant>> {
        let (restaurant, cuisines) = try_join!(self.records.find(id), self.cuisines.tags_of(id))?;
        match restaurant {
            Some(mut restaurant) => {
                restaurant.cuisines = cuisines;
                Ok(Some(restaurant))
            }
            None => {
                warn!(restaurant_id = id, "ranked id without a record; skipping");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, input), fields(rating = input.rating))]
    pub async fn add_review(&self, restaurant_id: &str, input: NewReview) -> Result<ReviewChange> {
        input.validate()?;
        self.records.require(restaurant_id).await?;

        let change = self.reviews.add(restaurant_id, &input).await?;
        info!(
            review_id = %change.review.id,
            average_rating = change.rating.average_rating,
            "review added"
        );
        #[cfg(feature = "emitter")]
        self.events.emit(REVIEW_ADDED, &change);
        Ok(change)
    }

    /// Most recent reviews first.
    #[instrument(skip(self))]
    pub async fn list_reviews(&self, restaurant_id: &str, page: Page) -> Result<Vec<Review>> {
        page.validate(self.config.max_page_size)?;
        self.records.require(restaurant_id).await?;
        self.reviews
            .list(restaurant_id, page.offset(), u64::from(page.limit))
            .await
    }

    /// Delete a review and rebalance the restaurant's aggregate.
    #[instrument(skip(self))]
    pub async fn remove_review(&self, restaurant_id: &str, review_id: &str) -> Result<ReviewChange> {
        self.records.require(restaurant_id).await?;

        let change = self.reviews.remove(restaurant_id, review_id).await?;
        info!(
            average_rating = change.rating.average_rating,
            review_count = change.rating.review_count,
            "review removed"
        );
        #[cfg(feature = "emitter")]
        self.events.emit(REVIEW_REMOVED, &change);
        Ok(change)
    }

    pub async fn cuisines(&self) -> Result<BTreeSet<String>> {
        self.cuisines.all_tags().await
    }

    pub async fn restaurants_by_cuisine(&self, tag: &str) -> Result<Vec<String>> {
        self.cuisines.restaurants_by_tag(tag).await
    }

    /// Name-prefix search, best rated first.
    #[instrument(skip(self))]
    pub async fn search(&self, prefix: &str, page: Page) -> Result<Vec<Restaurant>> {
        page.validate(self.config.max_page_size)?;
        self.search
            .search(prefix, page.offset(), u64::from(page.limit))
            .await
    }

    /// Current weather at the restaurant's coordinates, served from the cache
    /// while fresh. Provider failures are returned and not cached.
    #[instrument(skip(self))]
    pub async fn weather(&self, restaurant_id: &str) -> Result<serde_json::Value> {
        self.records.require(restaurant_id).await?;

        if let Some(cached) = self.weather.get(restaurant_id).await? {
            debug!("weather cache hit");
            return Ok(cached);
        }

        let location = self
            .records
            .location(restaurant_id)
            .await?
            .ok_or_else(|| Error::not_found("coordinates", restaurant_id))?;
        let at = Coordinates::parse(&location)
            .ok_or_else(|| Error::not_found("coordinates", restaurant_id))?;

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::Upstream("no weather provider configured".into()))?;
        let payload = provider.current(at).await?;

        self.weather.put_default(restaurant_id, &payload).await?;
        debug!(ttl_secs = self.weather.ttl().as_secs(), "weather cached");
        Ok(payload)
    }

    /// Replace the restaurant's free-form details document.
    #[instrument(skip(self, document))]
    pub async fn set_details(&self, restaurant_id: &str, document: serde_json::Value) -> Result<()> {
        self.records.require(restaurant_id).await?;
        self.details.set(restaurant_id, &document).await
    }

    #[instrument(skip(self))]
    pub async fn details(&self, restaurant_id: &str) -> Result<serde_json::Value> {
        self.records.require(restaurant_id).await?;
        self.details
            .get(restaurant_id)
            .await?
            .ok_or_else(|| Error::not_found("details", restaurant_id))
    }
}
