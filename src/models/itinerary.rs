//! Itinerary aggregate produced by the planner

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::travel::{FlightOption, HotelOption, PointOfInterest, TravelRequest};

/// One trip day extracted from the generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDayActivity {
    /// 1-based day number
    pub day: u32,
    pub date: NaiveDate,
    /// Everything written for the day, header excluded
    pub description: String,
    pub morning: Option<String>,
    pub afternoon: Option<String>,
    pub evening: Option<String>,
    pub accommodation: Option<String>,
}

/// Runner-up hotel shown next to the selected one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeHotel {
    pub name: String,
    pub price_per_night: f64,
    pub stars: f64,
    pub description: Option<String>,
}

impl From<&HotelOption> for AlternativeHotel {
    fn from(hotel: &HotelOption) -> Self {
        Self {
            name: hotel.name.clone(),
            price_per_night: hotel.price_per_night,
            stars: hotel.stars,
            description: hotel.description.clone(),
        }
    }
}

/// Where the itinerary text came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    #[default]
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    /// Assigned by the server when a client saves an itinerary without one
    #[serde(default)]
    pub request_id: String,
    pub travel_request: TravelRequest,
    pub selected_flight: Option<FlightOption>,
    pub selected_hotel: Option<HotelOption>,
    #[serde(default)]
    pub alternative_hotels: Vec<AlternativeHotel>,
    #[serde(default)]
    pub points_of_interest: Vec<PointOfInterest>,
    /// One entry per day that had a header in the text, ordered by day
    #[serde(default)]
    pub daily_plan: Vec<ItineraryDayActivity>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub total_cost: f64,
    pub raw_itinerary: Option<String>,
    #[serde(default)]
    pub source: GenerationSource,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Itinerary {
    #[must_use]
    pub fn duration(&self) -> u32 {
        self.travel_request.duration()
    }

    /// Days of the trip that have no entry in the daily plan
    #[must_use]
    pub fn missing_days(&self) -> Vec<u32> {
        (1..=self.duration())
            .filter(|day| !self.daily_plan.iter().any(|d| d.day == *day))
            .collect()
    }
}
