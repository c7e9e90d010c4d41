//! Trip request and the flat offer records returned by the data providers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{NomadError, Result};

/// Longest trip a request may span, in days
pub const MAX_TRIP_DAYS: u32 = 365;
/// Most preference labels one request may carry; each one is a place search
pub const MAX_PREFERENCES: usize = TravelPreference::ALL.len();

/// What the traveller asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: NaiveDate,
    /// Total budget in the configured currency
    pub budget: f64,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl TravelRequest {
    /// Trip length in days, counting both travel days. Never less than one.
    #[must_use]
    pub fn duration(&self) -> u32 {
        let days = (self.return_date - self.depart_date).num_days() + 1;
        u32::try_from(days.max(1)).unwrap_or(u32::MAX)
    }

    /// Date of the given 1-based trip day
    #[must_use]
    pub fn date_of_day(&self, day: u32) -> NaiveDate {
        self.depart_date + chrono::Days::new(u64::from(day.saturating_sub(1)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(NomadError::validation("Origin cannot be empty"));
        }
        if self.destination.trim().is_empty() {
            return Err(NomadError::validation("Destination cannot be empty"));
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(NomadError::validation("Budget must be a non-negative amount"));
        }
        if self.return_date < self.depart_date {
            return Err(NomadError::validation(format!(
                "Return date {} is before departure date {}",
                self.return_date, self.depart_date
            )));
        }
        if (self.return_date - self.depart_date).num_days() >= i64::from(MAX_TRIP_DAYS) {
            return Err(NomadError::validation(format!(
                "Trips cannot be longer than {MAX_TRIP_DAYS} days"
            )));
        }
        validate_preferences(&self.preferences)
    }
}

pub fn validate_preferences(preferences: &[String]) -> Result<()> {
    if preferences.len() > MAX_PREFERENCES {
        return Err(NomadError::validation(format!(
            "At most {MAX_PREFERENCES} preferences can be given"
        )));
    }
    Ok(())
}

/// Preference labels offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelPreference {
    Culture,
    Relaxation,
    Adventure,
    Food,
    Nature,
    Nightlife,
    Luxury,
    Budget,
    Family,
    Shopping,
    Beach,
    Mountain,
}

impl TravelPreference {
    pub const ALL: [TravelPreference; 12] = [
        TravelPreference::Culture,
        TravelPreference::Relaxation,
        TravelPreference::Adventure,
        TravelPreference::Food,
        TravelPreference::Nature,
        TravelPreference::Nightlife,
        TravelPreference::Luxury,
        TravelPreference::Budget,
        TravelPreference::Family,
        TravelPreference::Shopping,
        TravelPreference::Beach,
        TravelPreference::Mountain,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TravelPreference::Culture => "Culture",
            TravelPreference::Relaxation => "Relaxation",
            TravelPreference::Adventure => "Adventure",
            TravelPreference::Food => "Food",
            TravelPreference::Nature => "Nature",
            TravelPreference::Nightlife => "Nightlife",
            TravelPreference::Luxury => "Luxury",
            TravelPreference::Budget => "Budget",
            TravelPreference::Family => "Family",
            TravelPreference::Shopping => "Shopping",
            TravelPreference::Beach => "Beach",
            TravelPreference::Mountain => "Mountain",
        }
    }

    /// Case-insensitive lookup of a free-form label
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|preference| preference.as_str().eq_ignore_ascii_case(label))
    }

    /// Place search phrase for this preference
    #[must_use]
    pub fn search_phrase(self) -> &'static str {
        match self {
            TravelPreference::Culture => "museums and cultural sites",
            TravelPreference::Relaxation => "spas and quiet gardens",
            TravelPreference::Adventure => "adventure activities",
            TravelPreference::Food => "popular restaurants",
            TravelPreference::Nature => "parks and nature reserves",
            TravelPreference::Nightlife => "bars and nightlife",
            TravelPreference::Luxury => "luxury experiences",
            TravelPreference::Budget => "free attractions",
            TravelPreference::Family => "family friendly attractions",
            TravelPreference::Shopping => "shopping districts",
            TravelPreference::Beach => "beaches",
            TravelPreference::Mountain => "mountain viewpoints and hikes",
        }
    }
}

impl fmt::Display for TravelPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub airline: String,
    pub price: f64,
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: NaiveDate,
    pub flight_number: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOption {
    pub name: String,
    pub price_per_night: f64,
    pub stars: f64,
    pub city: String,
    pub address: Option<String>,
    pub hotel_id: Option<String>,
    pub chain_code: Option<String>,
    /// Distance from the city centre in km
    pub distance: Option<f64>,
    pub amenities: Option<Vec<String>>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub address: String,
    pub description: Option<String>,
    /// 0 (free) to 4 (very expensive)
    pub price_level: Option<u8>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
