//! JSON API served under `/api/v1`

pub mod extract;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    FlightOption, HotelOption, Itinerary, PointOfInterest, TravelPreference, TravelRequest,
    validate_preferences,
};
use crate::planner::ItineraryPlanner;
use crate::providers::TravelDataService;
use crate::store::ItineraryRepository;
use crate::{NomadError, Result, VERSION};

pub use extract::{USER_ID_HEADER, UserId};

pub const POPULAR_CITIES: [&str; 15] = [
    "Singapore",
    "Tokyo",
    "Paris",
    "London",
    "New York",
    "Bangkok",
    "Dubai",
    "Sydney",
    "San Francisco",
    "Los Angeles",
    "Barcelona",
    "Rome",
    "Hong Kong",
    "Seoul",
    "Bali",
];

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<ItineraryPlanner>,
    pub data: TravelDataService,
    pub repository: Arc<dyn ItineraryRepository>,
}

#[derive(Debug, Deserialize)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct HotelQuery {
    pub city: String,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct PoiQuery {
    pub city: String,
    /// Comma-separated preference labels
    #[serde(default)]
    pub preferences: Option<String>,
}

impl PoiQuery {
    fn preference_list(&self) -> Vec<String> {
        self.preferences
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct FlightsResponse {
    pub flights: Vec<FlightOption>,
}

#[derive(Debug, Serialize)]
pub struct HotelsResponse {
    pub hotels: Vec<HotelOption>,
}

#[derive(Debug, Serialize)]
pub struct PoisResponse {
    pub points_of_interest: Vec<PointOfInterest>,
}

impl From<JsonRejection> for NomadError {
    fn from(rejection: JsonRejection) -> Self {
        NomadError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for NomadError {
    fn from(rejection: QueryRejection) -> Self {
        NomadError::validation(rejection.body_text())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/travel/itinerary", post(create_itinerary))
        .route("/travel/flights", get(search_flights))
        .route("/travel/hotels", get(search_hotels))
        .route("/travel/points-of-interest", get(search_points_of_interest))
        .route("/travel/popular-cities", get(popular_cities))
        .route("/travel/preferences", get(preferences))
        .route(
            "/travel/itineraries",
            get(list_itineraries).post(save_itinerary),
        )
        .route("/travel/itineraries/{id}", get(get_itinerary))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "NomadAI",
        "version": VERSION,
        "cache": state.data.cache().stats(),
    }))
}

#[instrument(skip_all, fields(user = %user.0))]
async fn create_itinerary(
    State(state): State<AppState>,
    user: UserId,
    payload: std::result::Result<Json<TravelRequest>, JsonRejection>,
) -> Result<Json<Itinerary>> {
    let Json(request) = payload?;
    request.validate()?;
    info!(
        "Creating itinerary: {} to {}",
        request.origin, request.destination
    );

    let (flights, hotels, pois) = tokio::join!(
        state.data.search_flights(
            &request.origin,
            &request.destination,
            request.depart_date,
            request.return_date,
        ),
        state
            .data
            .search_hotels(&request.destination, request.depart_date, request.return_date),
        state
            .data
            .search_points_of_interest(&request.destination, &request.preferences),
    );
    let pois = pois.unwrap_or_else(|err| {
        warn!("Planning without points of interest: {}", err);
        Vec::new()
    });

    let itinerary = state
        .planner
        .create_itinerary(&request, flights?, hotels?, pois)
        .await?;
    state.repository.save(&user.0, itinerary.clone()).await?;
    Ok(Json(itinerary))
}

async fn search_flights(
    State(state): State<AppState>,
    query: std::result::Result<Query<FlightQuery>, QueryRejection>,
) -> Result<Json<FlightsResponse>> {
    let Query(query) = query?;
    let flights = state
        .data
        .search_flights(
            &query.origin,
            &query.destination,
            query.depart_date,
            query.return_date,
        )
        .await?;
    Ok(Json(FlightsResponse { flights }))
}

async fn search_hotels(
    State(state): State<AppState>,
    query: std::result::Result<Query<HotelQuery>, QueryRejection>,
) -> Result<Json<HotelsResponse>> {
    let Query(query) = query?;
    let hotels = state
        .data
        .search_hotels(&query.city, query.checkin_date, query.checkout_date)
        .await?;
    Ok(Json(HotelsResponse { hotels }))
}

async fn search_points_of_interest(
    State(state): State<AppState>,
    query: std::result::Result<Query<PoiQuery>, QueryRejection>,
) -> Result<Json<PoisResponse>> {
    let Query(query) = query?;
    let preferences = query.preference_list();
    validate_preferences(&preferences)?;
    let points_of_interest = state
        .data
        .search_points_of_interest(&query.city, &preferences)
        .await?;
    Ok(Json(PoisResponse { points_of_interest }))
}

async fn popular_cities() -> Json<Value> {
    Json(json!({ "cities": POPULAR_CITIES }))
}

async fn preferences() -> Json<Value> {
    let labels: Vec<&str> = TravelPreference::ALL.iter().map(|p| p.as_str()).collect();
    Json(json!({ "preferences": labels }))
}

async fn list_itineraries(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<Vec<Itinerary>>> {
    Ok(Json(state.repository.list_for(&user.0).await?))
}

#[instrument(skip_all, fields(user = %user.0))]
async fn save_itinerary(
    State(state): State<AppState>,
    user: UserId,
    payload: std::result::Result<Json<Itinerary>, JsonRejection>,
) -> Result<Json<Itinerary>> {
    let Json(mut itinerary) = payload?;
    if itinerary.travel_request.destination.trim().is_empty() {
        return Err(NomadError::validation("Invalid itinerary data: missing destination"));
    }
    if itinerary.request_id.trim().is_empty() {
        itinerary.request_id = Uuid::new_v4().to_string();
    }

    state.repository.save(&user.0, itinerary.clone()).await?;
    info!("Saved itinerary {}", itinerary.request_id);
    Ok(Json(itinerary))
}

async fn get_itinerary(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Itinerary>> {
    state
        .repository
        .find(&user.0, &id)
        .await?
        .map(Json)
        .ok_or_else(|| NomadError::not_found(format!("Itinerary {id} not found")))
}
