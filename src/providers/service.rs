//! Cache-fronted access to the travel data providers

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::Providers;
use crate::Result;
use crate::cache::ExpiringCache;
use crate::config::CacheConfig;
use crate::models::{FlightOption, HotelOption, PointOfInterest};

/// How long each kind of search result stays cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub flights: Duration,
    pub hotels: Duration,
    pub pois: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            flights: config.flight_ttl(),
            hotels: config.hotel_ttl(),
            pois: config.poi_ttl(),
        }
    }
}

#[derive(Clone)]
pub struct TravelDataService {
    cache: Arc<ExpiringCache>,
    providers: Providers,
    ttls: CacheTtls,
}

impl TravelDataService {
    pub fn new(cache: Arc<ExpiringCache>, providers: Providers, ttls: CacheTtls) -> Self {
        Self {
            cache,
            providers,
            ttls,
        }
    }

    pub fn cache(&self) -> &Arc<ExpiringCache> {
        &self.cache
    }

    #[instrument(skip(self))]
    pub async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Vec<FlightOption>> {
        let key = flights_key(origin, destination, depart_date, return_date);
        self.cached(&key, self.ttls.flights, || {
            self.providers
                .flights
                .search_flights(origin, destination, depart_date, return_date)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn search_hotels(
        &self,
        city: &str,
        checkin_date: NaiveDate,
        checkout_date: NaiveDate,
    ) -> Result<Vec<HotelOption>> {
        let key = hotels_key(city, checkin_date, checkout_date);
        self.cached(&key, self.ttls.hotels, || {
            self.providers
                .hotels
                .search_hotels(city, checkin_date, checkout_date)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn search_points_of_interest(
        &self,
        city: &str,
        preferences: &[String],
    ) -> Result<Vec<PointOfInterest>> {
        let key = pois_key(city, preferences);
        self.cached(&key, self.ttls.pois, || {
            self.providers
                .pois
                .search_points_of_interest(city, preferences)
        })
        .await
    }

    /// Serves `key` from the cache or calls `fetch` and stores its result.
    /// Errors are not cached. An empty list or an entry that no longer
    /// deserializes counts as a miss.
    async fn cached<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cache.get(key) {
            if value.as_array().is_some_and(Vec::is_empty) {
                debug!("Refetching empty result for {}", key);
            } else {
                match serde_json::from_value(value) {
                    Ok(hit) => {
                        debug!("Cache hit for {}", key);
                        return Ok(hit);
                    }
                    Err(err) => warn!("Discarding unreadable cache entry {}: {}", key, err),
                }
            }
        }

        let fresh = fetch().await?;
        if let Err(err) = self.cache.set(key, &fresh, ttl) {
            warn!("Could not cache {}: {}", key, err);
        }
        Ok(fresh)
    }
}

fn flights_key(origin: &str, destination: &str, depart: NaiveDate, ret: NaiveDate) -> String {
    format!("flights:{origin}:{destination}:{depart}:{ret}")
}

fn hotels_key(city: &str, checkin: NaiveDate, checkout: NaiveDate) -> String {
    format!("hotels:{city}:{checkin}:{checkout}")
}

/// Preference order does not change the key
fn pois_key(city: &str, preferences: &[String]) -> String {
    let mut sorted: Vec<&str> = preferences.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("pois:{city}:{}", sorted.join(","))
}
