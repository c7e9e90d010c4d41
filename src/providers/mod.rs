//! Travel data providers
//!
//! Each upstream capability is a trait so the service can be wired with the
//! real HTTP clients in production and with fixtures in tests:
//! - [`FlightSearch`] / [`HotelSearch`]: Amadeus
//! - [`PoiSearch`]: Google Places
//!
//! [`TravelDataService`] sits in front of them and owns the cache keys.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::Result;
use crate::models::{FlightOption, HotelOption, PointOfInterest};

pub mod amadeus;
pub mod google_places;
mod http;
pub mod service;

pub use amadeus::AmadeusClient;
pub use google_places::GooglePlacesClient;
pub use service::{CacheTtls, TravelDataService};

#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Vec<FlightOption>>;
}

#[async_trait]
pub trait HotelSearch: Send + Sync {
    async fn search_hotels(
        &self,
        city: &str,
        checkin_date: NaiveDate,
        checkout_date: NaiveDate,
    ) -> Result<Vec<HotelOption>>;
}

#[async_trait]
pub trait PoiSearch: Send + Sync {
    async fn search_points_of_interest(
        &self,
        city: &str,
        preferences: &[String],
    ) -> Result<Vec<PointOfInterest>>;
}

/// The three capabilities bundled for injection
#[derive(Clone)]
pub struct Providers {
    pub flights: Arc<dyn FlightSearch>,
    pub hotels: Arc<dyn HotelSearch>,
    pub pois: Arc<dyn PoiSearch>,
}
