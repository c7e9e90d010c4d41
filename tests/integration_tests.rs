//! Router-level tests with stub providers and generators

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

use nomadai::api::AppState;
use nomadai::config::{PlannerConfig, ServerConfig};
use nomadai::llm::{ChatRequest, TextGenerator};
use nomadai::models::{FlightOption, HotelOption, PointOfInterest};
use nomadai::providers::{CacheTtls, FlightSearch, HotelSearch, PoiSearch, Providers};
use nomadai::{
    ExpiringCache, InMemoryItineraryRepository, ItineraryPlanner, NomadError, Result,
    TravelDataService, web,
};

struct StubProvider {
    flights: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl FlightSearch for StubProvider {
    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Vec<FlightOption>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.flights {
            return Ok(vec![]);
        }
        Ok(vec![FlightOption {
            airline: "SINGAPORE AIRLINES".into(),
            price: 780.0,
            origin: origin.into(),
            destination: destination.into(),
            depart_date,
            return_date,
            flight_number: Some("SQ638".into()),
            departure_time: Some("2025-11-10T23:55:00".into()),
            arrival_time: Some("2025-11-11T07:30:00".into()),
        }])
    }
}

#[async_trait]
impl HotelSearch for StubProvider {
    async fn search_hotels(
        &self,
        city: &str,
        _checkin_date: NaiveDate,
        _checkout_date: NaiveDate,
    ) -> Result<Vec<HotelOption>> {
        Ok(["Park Hotel", "Ryokan Sawanoya"]
            .into_iter()
            .map(|name| HotelOption {
                name: name.into(),
                price_per_night: 160.0,
                stars: 4.0,
                city: city.into(),
                address: None,
                hotel_id: None,
                chain_code: None,
                distance: None,
                amenities: None,
                description: None,
                image_url: None,
            })
            .collect())
    }
}

#[async_trait]
impl PoiSearch for StubProvider {
    async fn search_points_of_interest(
        &self,
        _city: &str,
        _preferences: &[String],
    ) -> Result<Vec<PointOfInterest>> {
        Err(NomadError::api("Google Places rate limit exceeded"))
    }
}

struct UnavailableModel;

#[async_trait]
impl TextGenerator for UnavailableModel {
    async fn generate(&self, _request: &ChatRequest) -> Result<String> {
        Err(NomadError::api("The model is overloaded"))
    }
}

fn app_with(provider: Arc<StubProvider>) -> Router {
    let cache = Arc::new(ExpiringCache::default());
    let providers = Providers {
        flights: provider.clone(),
        hotels: provider.clone(),
        pois: provider,
    };
    let state = AppState {
        planner: Arc::new(
            ItineraryPlanner::new(Arc::new(UnavailableModel), &PlannerConfig::default()).unwrap(),
        ),
        data: TravelDataService::new(cache, providers, CacheTtls::default()),
        repository: Arc::new(InMemoryItineraryRepository::new()),
    };
    web::app(state, &ServerConfig::default())
}

fn app() -> Router {
    app_with(Arc::new(StubProvider {
        flights: true,
        calls: AtomicUsize::new(0),
    }))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, user: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn trip() -> Value {
    json!({
        "origin": "Singapore",
        "destination": "Tokyo",
        "depart_date": "2025-11-10",
        "return_date": "2025-11-12",
        "budget": 2000.0,
        "preferences": ["Food", "Culture"]
    })
}

#[tokio::test]
async fn test_health_reports_version_and_cache() {
    let (status, body) = send(&app(), get("/api/v1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], nomadai::VERSION);
    assert_eq!(body["cache"]["entries"], 0);
}

#[tokio::test]
async fn test_itinerary_routes_require_user() {
    let app = app();
    let (status, body) = send(&app, post("/api/v1/travel/itinerary", None, &trip())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, get("/api/v1/travel/itineraries", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_model_outage_still_produces_saved_itinerary() {
    let app = app();
    let (status, itinerary) = send(
        &app,
        post("/api/v1/travel/itinerary", Some("ana@example.com"), &trip()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(itinerary["source"], "fallback");
    assert_eq!(itinerary["total_cost"], 1800.0);
    assert_eq!(itinerary["summary"], "# Trip to Tokyo");
    assert_eq!(itinerary["daily_plan"].as_array().unwrap().len(), 3);
    assert_eq!(itinerary["daily_plan"][2]["date"], "2025-11-12");
    assert_eq!(itinerary["selected_hotel"]["name"], "Park Hotel");
    assert_eq!(itinerary["alternative_hotels"][0]["name"], "Ryokan Sawanoya");
    assert_eq!(itinerary["points_of_interest"], json!([]));

    let id = itinerary["request_id"].as_str().unwrap();
    let (status, saved) = send(&app, get("/api/v1/travel/itineraries", Some("ana@example.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved.as_array().unwrap().len(), 1);
    assert_eq!(saved[0]["request_id"], id);

    let (status, one) = send(
        &app,
        get(&format!("/api/v1/travel/itineraries/{id}"), Some("ana@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["request_id"], id);

    let (status, _) = send(
        &app,
        get(&format!("/api/v1/travel/itineraries/{id}"), Some("ben@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_no_flights_is_not_found() {
    let app = app_with(Arc::new(StubProvider {
        flights: false,
        calls: AtomicUsize::new(0),
    }));
    let (status, body) = send(
        &app,
        post("/api/v1/travel/itinerary", Some("ana@example.com"), &trip()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No flights found from Singapore to Tokyo");

    let (_, saved) = send(&app, get("/api/v1/travel/itineraries", Some("ana@example.com"))).await;
    assert_eq!(saved, json!([]));
}

#[tokio::test]
async fn test_invalid_requests_are_bad_requests() {
    let app = app();

    let mut backwards = trip();
    backwards["return_date"] = json!("2025-11-01");
    let (status, body) = send(
        &app,
        post("/api/v1/travel/itinerary", Some("ana@example.com"), &backwards),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));

    let (status, _) = send(
        &app,
        post("/api/v1/travel/itinerary", Some("ana@example.com"), &json!({ "origin": "SIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/v1/travel/flights?origin=SIN", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_requests_are_rejected() {
    let app = app();

    let mut endless = trip();
    endless["return_date"] = json!("9999-12-31");
    let (status, body) = send(
        &app,
        post("/api/v1/travel/itinerary", Some("ana@example.com"), &endless),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("365 days"));

    let labels: Vec<String> = (0..50).map(|i| format!("Interest {i}")).collect();
    let mut crowded = trip();
    crowded["preferences"] = json!(labels);
    let (status, _) = send(
        &app,
        post("/api/v1/travel/itinerary", Some("ana@example.com"), &crowded),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/v1/travel/points-of-interest?city=Tokyo&preferences={}",
        labels.join(",").replace(' ', "%20")
    );
    let (status, _) = send(&app, get(&uri, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_flight_search_is_cached() {
    let provider = Arc::new(StubProvider {
        flights: true,
        calls: AtomicUsize::new(0),
    });
    let app = app_with(provider.clone());
    let uri = "/api/v1/travel/flights?origin=SIN&destination=NRT&depart_date=2025-11-10&return_date=2025-11-12";

    let (status, first) = send(&app, get(uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["flights"][0]["flight_number"], "SQ638");

    let (_, second) = send(&app, get(uri, None)).await;
    assert_eq!(first, second);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_poi_provider_failure_is_bad_gateway() {
    let (status, body) = send(
        &app(),
        get("/api/v1/travel/points-of-interest?city=Tokyo&preferences=Food,Culture", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("try again later"));
}

#[tokio::test]
async fn test_save_client_itinerary() {
    let app = app();
    let itinerary = json!({
        "travel_request": trip(),
        "selected_flight": null,
        "selected_hotel": null,
        "raw_itinerary": null,
        "summary": "Hand-made plan"
    });

    let (status, saved) = send(
        &app,
        post("/api/v1/travel/itineraries", Some("ana@example.com"), &itinerary),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!saved["request_id"].as_str().unwrap().is_empty());

    let mut no_destination = itinerary.clone();
    no_destination["travel_request"]["destination"] = json!("");
    let (status, body) = send(
        &app,
        post("/api/v1/travel/itineraries", Some("ana@example.com"), &no_destination),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing destination"));
}

#[tokio::test]
async fn test_static_lists() {
    let app = app();
    let (status, cities) = send(&app, get("/api/v1/travel/popular-cities", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cities["cities"].as_array().unwrap().len(), 15);
    assert_eq!(cities["cities"][0], "Singapore");

    let (_, preferences) = send(&app, get("/api/v1/travel/preferences", None)).await;
    assert_eq!(preferences["preferences"].as_array().unwrap().len(), 12);
    assert_eq!(preferences["preferences"][0], "Culture");
}
