//! Prompt context handed to the model
//!
//! Candidates are cut down to the fields the model needs; the result depends
//! only on its inputs.

use serde::Serialize;

use crate::models::{FlightOption, HotelOption, PointOfInterest, TravelRequest};

pub const SYSTEM_PROMPT: &str = "\
You are NomadAI, an intelligent travel planning assistant that creates personalized travel itineraries.
Your task is to create a detailed day-by-day travel plan based on the provided flight, hotel, and points of interest data.

Guidelines:
1. Create a practical, coherent, and well-structured itinerary that respects the user's budget and preferences
2. Distribute points of interest across days in a logical way, considering location and opening times
3. Include specific flight and hotel recommendations from the provided options
4. Add practical details like transportation between attractions
5. Make the itinerary realistic in terms of timing and distances
6. Include estimated costs for activities when possible
7. Format the output in clear, well-organized markdown
8. Make sure the total cost (flight + hotel + activities) stays within the user's budget

Your response should include:
- A brief introduction summarizing the trip
- A suggested flight and hotel with prices
- A day-by-day breakdown using a '### Day N' header per day, with 'Morning:', 'Afternoon:' and 'Evening:' lines
- An estimated total cost breakdown ending with a 'Total cost:' line";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDetails<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub duration_days: u32,
    pub start_date: String,
    pub end_date: String,
    pub budget: f64,
    pub preferences: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary<'a> {
    pub airline: &'a str,
    pub price: f64,
    pub departure_time: Option<&'a str>,
    pub arrival_time: Option<&'a str>,
    pub flight_number: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelSummary<'a> {
    pub name: &'a str,
    pub price_per_night: f64,
    pub stars: f64,
    pub address: Option<&'a str>,
    pub amenities: Option<&'a [String]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiSummary<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub rating: f64,
    pub address: &'a str,
    pub description: Option<&'a str>,
    pub price_level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningContext<'a> {
    pub trip_details: TripDetails<'a>,
    pub flights: Vec<FlightSummary<'a>>,
    pub hotels: Vec<HotelSummary<'a>>,
    pub points_of_interest: Vec<PoiSummary<'a>>,
}

impl<'a> PlanningContext<'a> {
    #[must_use]
    pub fn build(
        request: &'a TravelRequest,
        flights: &'a [FlightOption],
        hotels: &'a [HotelOption],
        pois: &'a [PointOfInterest],
    ) -> Self {
        Self {
            trip_details: TripDetails {
                origin: &request.origin,
                destination: &request.destination,
                duration_days: request.duration(),
                start_date: request.depart_date.to_string(),
                end_date: request.return_date.to_string(),
                budget: request.budget,
                preferences: &request.preferences,
            },
            flights: flights
                .iter()
                .map(|f| FlightSummary {
                    airline: &f.airline,
                    price: f.price,
                    departure_time: f.departure_time.as_deref(),
                    arrival_time: f.arrival_time.as_deref(),
                    flight_number: f.flight_number.as_deref(),
                })
                .collect(),
            hotels: hotels
                .iter()
                .map(|h| HotelSummary {
                    name: &h.name,
                    price_per_night: h.price_per_night,
                    stars: h.stars,
                    address: h.address.as_deref(),
                    amenities: h.amenities.as_deref(),
                })
                .collect(),
            points_of_interest: pois
                .iter()
                .map(|p| PoiSummary {
                    name: &p.name,
                    category: &p.category,
                    rating: p.rating,
                    address: &p.address,
                    description: p.description.as_deref(),
                    price_level: p.price_level,
                })
                .collect(),
        }
    }

    /// User turn of the conversation: the ask, the preferences and the data.
    pub fn user_message(&self, currency: &str) -> serde_json::Result<String> {
        let trip = &self.trip_details;
        let preferences = if trip.preferences.is_empty() {
            "no specific preferences".to_string()
        } else {
            trip.preferences.join(", ")
        };

        Ok(format!(
            "Please plan a {}-day trip from {} to {} with a budget of {currency} {}.\n\n\
             The traveler has indicated the following preferences: {preferences}.\n\n\
             Data:\n{}",
            trip.duration_days,
            trip.origin,
            trip.destination,
            trip.budget,
            serde_json::to_string_pretty(self)?
        ))
    }
}
