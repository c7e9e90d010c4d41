//! Amadeus self-service client: flight offers, hotel lists and hotel prices

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

use super::http::{error_for_status, retrying_client};
use super::{FlightSearch, HotelSearch};
use crate::config::AmadeusConfig;
use crate::models::{FlightOption, HotelOption};
use crate::{NomadError, Result};

const PROVIDER: &str = "Amadeus";
/// Refresh the token this long before Amadeus says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_STARS: f64 = 3.0;

pub struct AmadeusClient {
    client: ClientWithMiddleware,
    token_client: reqwest::Client,
    api_key: Option<String>,
    api_secret: Option<String>,
    base_url: String,
    currency: String,
    max_flight_offers: u32,
    max_hotels: u32,
    token: AsyncMutex<Option<AccessToken>>,
    location_codes: Mutex<HashMap<String, String>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<LocationData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationData {
    iata_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightOffersResponse {
    #[serde(default)]
    data: Vec<FlightOfferData>,
    dictionaries: Option<FlightDictionaries>,
}

#[derive(Debug, Deserialize)]
struct FlightDictionaries {
    #[serde(default)]
    carriers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightOfferData {
    price: OfferPrice,
    #[serde(default)]
    validating_airline_codes: Vec<String>,
    #[serde(default)]
    itineraries: Vec<FlightItinerary>,
}

#[derive(Debug, Deserialize)]
struct OfferPrice {
    total: String,
}

#[derive(Debug, Deserialize)]
struct FlightItinerary {
    #[serde(default)]
    segments: Vec<FlightSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightSegment {
    departure: FlightEndpoint,
    arrival: FlightEndpoint,
    carrier_code: String,
    number: String,
}

#[derive(Debug, Deserialize)]
struct FlightEndpoint {
    at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HotelListResponse {
    #[serde(default)]
    data: Vec<HotelData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelData {
    name: String,
    hotel_id: Option<String>,
    chain_code: Option<String>,
    address: Option<HotelAddress>,
    distance: Option<HotelDistance>,
    rating: Option<Value>,
    #[serde(default)]
    amenities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelAddress {
    #[serde(default)]
    lines: Vec<String>,
    city_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotelDistance {
    value: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HotelOffersResponse {
    #[serde(default)]
    data: Vec<HotelOffersData>,
}

#[derive(Debug, Deserialize)]
struct HotelOffersData {
    hotel: HotelRef,
    #[serde(default)]
    offers: Vec<HotelOffer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelRef {
    hotel_id: String,
}

#[derive(Debug, Deserialize)]
struct HotelOffer {
    price: OfferPrice,
}

impl AmadeusClient {
    pub fn new(config: &AmadeusConfig, currency: &str) -> Result<Self> {
        let token_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| NomadError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client: retrying_client(config.timeout_seconds, config.max_retries)?,
            token_client,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            currency: currency.to_string(),
            max_flight_offers: config.max_flight_offers,
            max_hotels: config.max_hotels,
            token: AsyncMutex::new(None),
            location_codes: Mutex::new(HashMap::new()),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{path}", self.base_url), params)
            .map_err(|e| NomadError::config(format!("Invalid Amadeus URL: {e}")))
    }

    /// Bearer token from the client-credentials flow, reused until shortly
    /// before it expires.
    async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if Instant::now() < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        let (Some(api_key), Some(api_secret)) = (&self.api_key, &self.api_secret) else {
            return Err(NomadError::config("Amadeus API credentials are not configured"));
        };

        debug!("Requesting a new Amadeus access token");
        let response = self
            .token_client
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", api_key.as_str()),
                ("client_secret", api_secret.as_str()),
            ])
            .send()
            .await?;
        let response: TokenResponse = error_for_status(PROVIDER, response).await?.json().await?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *token = Some(AccessToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(response.access_token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.access_token().await?;
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let parsed = error_for_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| NomadError::api(format!("Invalid data received from Amadeus: {e}")))?;
        Ok(parsed)
    }

    /// IATA code for a city or airport name. Three-letter inputs are taken as
    /// codes already.
    #[instrument(skip(self))]
    pub async fn resolve_location_code(&self, keyword: &str, sub_type: &str) -> Result<String> {
        let keyword = keyword.trim();
        if let Some(code) = as_iata_code(keyword) {
            return Ok(code);
        }

        let cache_key = format!("{sub_type}:{}", keyword.to_lowercase());
        if let Some(code) = self.location_codes.lock().get(&cache_key) {
            return Ok(code.clone());
        }

        let url = self.url(
            "/v1/reference-data/locations",
            &[
                ("subType", sub_type.to_string()),
                ("keyword", keyword.to_string()),
                ("page[limit]", "1".to_string()),
            ],
        )?;
        let response: LocationsResponse = self.get_json(url).await?;
        let code = response
            .data
            .into_iter()
            .find_map(|location| location.iata_code)
            .ok_or_else(|| NomadError::not_found(format!("Unknown city or airport: {keyword}")))?;

        debug!("Resolved {} to {}", keyword, code);
        self.location_codes.lock().insert(cache_key, code.clone());
        Ok(code)
    }

    /// Per-night prices keyed by hotel id. Missing offers are simply absent.
    async fn hotel_prices(
        &self,
        hotel_ids: &[String],
        checkin_date: NaiveDate,
        checkout_date: NaiveDate,
    ) -> Result<HashMap<String, f64>> {
        if hotel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.url(
            "/v3/shopping/hotel-offers",
            &[
                ("hotelIds", hotel_ids.join(",")),
                ("checkInDate", checkin_date.to_string()),
                ("checkOutDate", checkout_date.to_string()),
                ("adults", "1".to_string()),
                ("currency", self.currency.clone()),
            ],
        )?;
        let response: HotelOffersResponse = self.get_json(url).await?;
        let nights = (checkout_date - checkin_date).num_days().max(1) as f64;
        Ok(nightly_prices(response, nights))
    }
}

#[async_trait]
impl FlightSearch for AmadeusClient {
    #[instrument(skip(self))]
    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Vec<FlightOption>> {
        let origin_code = self.resolve_location_code(origin, "CITY,AIRPORT").await?;
        let destination_code = self.resolve_location_code(destination, "CITY,AIRPORT").await?;

        let url = self.url(
            "/v2/shopping/flight-offers",
            &[
                ("originLocationCode", origin_code.clone()),
                ("destinationLocationCode", destination_code.clone()),
                ("departureDate", depart_date.to_string()),
                ("returnDate", return_date.to_string()),
                ("adults", "1".to_string()),
                ("max", self.max_flight_offers.to_string()),
                ("currencyCode", self.currency.clone()),
            ],
        )?;

        let response: FlightOffersResponse = self.get_json(url).await?;
        let flights = map_flight_offers(
            response,
            &origin_code,
            &destination_code,
            depart_date,
            return_date,
        );
        info!("Found {} flight offers from {} to {}", flights.len(), origin_code, destination_code);
        Ok(flights)
    }
}

#[async_trait]
impl HotelSearch for AmadeusClient {
    #[instrument(skip(self))]
    async fn search_hotels(
        &self,
        city: &str,
        checkin_date: NaiveDate,
        checkout_date: NaiveDate,
    ) -> Result<Vec<HotelOption>> {
        let city_code = self.resolve_location_code(city, "CITY").await?;
        let url = self.url(
            "/v1/reference-data/locations/hotels/by-city",
            &[("cityCode", city_code.clone())],
        )?;

        let response: HotelListResponse = self.get_json(url).await?;
        let mut hotels = map_hotels(response, city, self.max_hotels as usize);

        let ids: Vec<String> = hotels.iter().filter_map(|h| h.hotel_id.clone()).collect();
        match self.hotel_prices(&ids, checkin_date, checkout_date).await {
            Ok(prices) => {
                for hotel in &mut hotels {
                    if let Some(price) = hotel.hotel_id.as_ref().and_then(|id| prices.get(id)) {
                        hotel.price_per_night = *price;
                    }
                }
            }
            Err(err) => warn!("Hotel prices unavailable for {}: {}", city_code, err),
        }

        info!("Found {} hotels in {}", hotels.len(), city_code);
        Ok(hotels)
    }
}

fn as_iata_code(keyword: &str) -> Option<String> {
    (keyword.len() == 3 && keyword.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| keyword.to_ascii_uppercase())
}

fn map_flight_offers(
    response: FlightOffersResponse,
    origin: &str,
    destination: &str,
    depart_date: NaiveDate,
    return_date: NaiveDate,
) -> Vec<FlightOption> {
    let carriers = response
        .dictionaries
        .map(|d| d.carriers)
        .unwrap_or_default();

    response
        .data
        .into_iter()
        .filter_map(|offer| {
            let Ok(price) = offer.price.total.parse::<f64>() else {
                warn!("Skipping flight offer with price {:?}", offer.price.total);
                return None;
            };
            let outbound = offer.itineraries.first().map(|i| i.segments.as_slice()).unwrap_or_default();
            let first = outbound.first();
            let last = outbound.last();

            let carrier = offer
                .validating_airline_codes
                .first()
                .cloned()
                .or_else(|| first.map(|s| s.carrier_code.clone()))
                .unwrap_or_else(|| "Unknown airline".to_string());
            let airline = carriers.get(&carrier).cloned().unwrap_or(carrier);

            Some(FlightOption {
                airline,
                price,
                origin: origin.to_string(),
                destination: destination.to_string(),
                depart_date,
                return_date,
                flight_number: first.map(|s| format!("{}{}", s.carrier_code, s.number)),
                departure_time: first.map(|s| s.departure.at.clone()),
                arrival_time: last.map(|s| s.arrival.at.clone()),
            })
        })
        .collect()
}

fn map_hotels(response: HotelListResponse, city: &str, limit: usize) -> Vec<HotelOption> {
    response
        .data
        .into_iter()
        .take(limit)
        .map(|hotel| {
            let stars = hotel
                .rating
                .as_ref()
                .and_then(|rating| match rating {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                })
                .unwrap_or(DEFAULT_STARS);
            let address = hotel.address.as_ref().and_then(|a| {
                a.lines
                    .first()
                    .cloned()
                    .or_else(|| a.city_name.clone())
            });

            HotelOption {
                name: hotel.name,
                price_per_night: 0.0,
                stars,
                city: city.to_string(),
                address,
                hotel_id: hotel.hotel_id,
                chain_code: hotel.chain_code,
                distance: hotel.distance.map(|d| d.value),
                amenities: (!hotel.amenities.is_empty()).then_some(hotel.amenities),
                description: None,
                image_url: None,
            }
        })
        .collect()
}

fn nightly_prices(response: HotelOffersResponse, nights: f64) -> HashMap<String, f64> {
    response
        .data
        .into_iter()
        .filter_map(|entry| {
            let cheapest = entry
                .offers
                .iter()
                .filter_map(|offer| offer.price.total.parse::<f64>().ok())
                .fold(None, |best: Option<f64>, price| {
                    Some(best.map_or(price, |b| b.min(price)))
                })?;
            Some((entry.hotel.hotel_id, cheapest / nights))
        })
        .collect()
}
