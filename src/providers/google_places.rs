//! Google Places text search for points of interest

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use super::PoiSearch;
use super::http::{error_for_status, retrying_client};
use crate::config::GooglePlacesConfig;
use crate::models::{PointOfInterest, TravelPreference};
use crate::{NomadError, Result};

const PROVIDER: &str = "Google Places";
const DEFAULT_QUERY: &str = "top tourist attractions";
const PHOTO_MAX_WIDTH: u32 = 400;
/// Text searches in flight at once for one lookup
const CONCURRENT_QUERIES: usize = 4;
/// Place types that say nothing about what the place is
const GENERIC_TYPES: [&str; 2] = ["point_of_interest", "establishment"];

pub struct GooglePlacesClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    formatted_address: Option<String>,
    rating: Option<f64>,
    price_level: Option<u8>,
    #[serde(default)]
    types: Vec<String>,
    geometry: Option<Geometry>,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// One text query and the category its results fall back to
#[derive(Debug, Clone, PartialEq)]
struct PlaceQuery {
    phrase: String,
    category: String,
}

impl GooglePlacesClient {
    pub fn new(config: &GooglePlacesConfig) -> Result<Self> {
        Ok(Self {
            client: retrying_client(config.timeout_seconds, config.max_retries)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results as usize,
        })
    }

    fn photo_url(&self, api_key: &str, photo_reference: &str) -> String {
        format!(
            "{}/photo?maxwidth={PHOTO_MAX_WIDTH}&photo_reference={}&key={}",
            self.base_url,
            urlencoding::encode(photo_reference),
            urlencoding::encode(api_key)
        )
    }

    async fn text_search(&self, api_key: &str, query: String) -> Result<TextSearchResponse> {
        let url = format!(
            "{}/textsearch/json?query={}&key={}",
            self.base_url,
            urlencoding::encode(&query),
            urlencoding::encode(api_key)
        );
        debug!("Places text search: {}", query);

        let response = self.client.get(&url).send().await?;
        let response: TextSearchResponse = error_for_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| NomadError::api(format!("Invalid data received from {PROVIDER}: {e}")))?;
        check_status(&response)?;
        Ok(response)
    }
}

#[async_trait]
impl PoiSearch for GooglePlacesClient {
    #[instrument(skip(self))]
    async fn search_points_of_interest(
        &self,
        city: &str,
        preferences: &[String],
    ) -> Result<Vec<PointOfInterest>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(NomadError::config(
                "Google Places API key is not configured",
            ));
        };

        let queries = build_queries(preferences);
        let searches: Vec<_> = queries
            .iter()
            .map(|query| self.text_search(api_key, format!("{} in {city}", query.phrase)))
            .collect();
        let responses: Vec<_> = stream::iter(searches)
            .buffered(CONCURRENT_QUERIES)
            .collect()
            .await;

        let mut batches = Vec::with_capacity(queries.len());
        let mut first_error = None;
        for (query, response) in queries.into_iter().zip(responses) {
            match response {
                Ok(response) => batches.push((query.category, response)),
                Err(err) => {
                    warn!("Place search for {} failed: {}", query.phrase, err);
                    first_error.get_or_insert(err);
                }
            }
        }
        if batches.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        let mut pois = merge_results(batches, self.max_results);
        for poi in &mut pois {
            if let Some(reference) = poi.image_url.take() {
                poi.image_url = Some(self.photo_url(api_key, &reference));
            }
        }
        info!("Found {} points of interest in {}", pois.len(), city);
        Ok(pois)
    }
}

fn check_status(response: &TextSearchResponse) -> Result<()> {
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "REQUEST_DENIED" => Err(NomadError::api(format!(
            "{PROVIDER} rejected the request: {}",
            response
                .error_message
                .as_deref()
                .unwrap_or("request denied")
        ))),
        status => Err(NomadError::api(format!(
            "{PROVIDER} returned {status}: {}",
            response.error_message.as_deref().unwrap_or_default()
        ))),
    }
}

/// One query per distinct preference; unknown labels are searched verbatim
fn build_queries(preferences: &[String]) -> Vec<PlaceQuery> {
    let mut seen = HashSet::new();
    let queries: Vec<PlaceQuery> = preferences
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.to_lowercase()))
        .map(|label| match TravelPreference::parse(label) {
            Some(preference) => PlaceQuery {
                phrase: preference.search_phrase().to_string(),
                category: preference.as_str().to_string(),
            },
            None => PlaceQuery {
                phrase: label.to_string(),
                category: label.to_string(),
            },
        })
        .collect();

    if queries.is_empty() {
        vec![PlaceQuery {
            phrase: DEFAULT_QUERY.to_string(),
            category: "Attraction".to_string(),
        }]
    } else {
        queries
    }
}

fn category_of(types: &[String], fallback: &str) -> String {
    types
        .iter()
        .find(|t| !GENERIC_TYPES.contains(&t.as_str()))
        .map(|t| t.replace('_', " "))
        .unwrap_or_else(|| fallback.to_string())
}

/// Flattens per-query results in query order, dropping repeated names.
/// `image_url` carries the raw photo reference until the caller builds the URL.
fn merge_results(batches: Vec<(String, TextSearchResponse)>, limit: usize) -> Vec<PointOfInterest> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flat_map(|(category, response)| {
            response
                .results
                .into_iter()
                .map(move |place| (category.clone(), place))
        })
        .filter(|(_, place)| seen.insert(place.name.clone()))
        .take(limit)
        .map(|(category, place)| PointOfInterest {
            category: category_of(&place.types, &category),
            rating: place.rating.unwrap_or(0.0),
            address: place.formatted_address.unwrap_or_default(),
            description: None,
            price_level: place.price_level,
            image_url: place.photos.first().map(|p| p.photo_reference.clone()),
            latitude: place.geometry.as_ref().map(|g| g.location.lat),
            longitude: place.geometry.as_ref().map(|g| g.location.lng),
            name: place.name,
        })
        .collect()
}
