use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use nomadai::api::AppState;
use nomadai::llm::OpenAiClient;
use nomadai::providers::{AmadeusClient, CacheTtls, GooglePlacesClient, Providers};
use nomadai::{
    ExpiringCache, InMemoryItineraryRepository, ItineraryPlanner, NomadConfig, TravelDataService,
    VERSION, telemetry, web,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NomadConfig::load().context("Failed to load configuration")?;
    let telemetry = telemetry::init(&config.logging, &config.telemetry)?;

    info!("Starting NomadAI {}", VERSION);
    if config.openai.api_key.is_none() {
        info!("No OpenAI API key configured, itineraries will use the template");
    }

    let cache = Arc::new(ExpiringCache::new(config.cache.sweep_interval()));
    cache.start();

    let amadeus = Arc::new(AmadeusClient::new(&config.amadeus, &config.planner.currency)?);
    let places = Arc::new(GooglePlacesClient::new(&config.google_places)?);
    let providers = Providers {
        flights: amadeus.clone(),
        hotels: amadeus,
        pois: places,
    };

    let generator = Arc::new(OpenAiClient::new(&config.openai)?);
    let state = AppState {
        planner: Arc::new(ItineraryPlanner::new(generator, &config.planner)?),
        data: TravelDataService::new(cache.clone(), providers, CacheTtls::from(&config.cache)),
        repository: Arc::new(InMemoryItineraryRepository::new()),
    };

    let served = web::run(state, &config.server).await;

    cache.stop().await;
    telemetry.shutdown();
    served
}
