//! Data models for the NomadAI planner
//!
//! - Travel: the trip request and the flight/hotel/sight offers
//! - Itinerary: the generated day-by-day plan

pub mod itinerary;
pub mod travel;

pub use itinerary::{AlternativeHotel, GenerationSource, Itinerary, ItineraryDayActivity};
pub use travel::{
    FlightOption, HotelOption, MAX_PREFERENCES, MAX_TRIP_DAYS, PointOfInterest, TravelPreference,
    TravelRequest, validate_preferences,
};
