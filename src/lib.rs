//! `NomadAI` - travel itinerary planning backend
//!
//! Flight, hotel and sight candidates are fetched from upstream providers
//! behind an expiring cache, handed to a language model, and the generated
//! text is parsed into a day-by-day plan. A templated itinerary stands in
//! whenever the model is unavailable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod planner;
pub mod providers;
pub mod store;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheStats, ExpiringCache};
pub use config::NomadConfig;
pub use error::NomadError;
pub use models::{Itinerary, TravelRequest};
pub use planner::ItineraryPlanner;
pub use providers::TravelDataService;
pub use store::{InMemoryItineraryRepository, ItineraryRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, NomadError>;
