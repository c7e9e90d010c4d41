//! Templated itinerary used when the model call fails

use std::fmt::Write;

use super::parser::DEFAULT_COST_RATIO;
use crate::models::TravelRequest;

pub const MORNING_PLACEHOLDER: &str = "Breakfast at hotel, explore local area";
pub const AFTERNOON_PLACEHOLDER: &str = "Visit main tourist attractions";
pub const EVENING_PLACEHOLDER: &str = "Dinner at local restaurant";

/// Minimal itinerary text that the parser always understands: one `### Day N`
/// section per trip day and an estimated total of 90% of the budget.
#[must_use]
pub fn fallback_itinerary(request: &TravelRequest, currency: &str) -> String {
    let duration = request.duration();
    let origin = &request.origin;
    let destination = &request.destination;

    let mut text = format!("# Trip to {destination}\n\n");
    text.push_str("## Overview\n");
    let _ = write!(
        text,
        "A {duration}-day trip to {destination} from {origin}.\n\n"
    );

    text.push_str("## Suggested Flight\n");
    let _ = write!(
        text,
        "Economy class flight from {origin} to {destination}.\n\n"
    );

    text.push_str("## Suggested Accommodation\n");
    let _ = write!(text, "Standard hotel in {destination} city center.\n\n");

    text.push_str("## Day-by-Day Itinerary\n");
    for day in 1..=duration {
        let _ = write!(
            text,
            "### Day {day}\n- Morning: {MORNING_PLACEHOLDER}\n- Afternoon: {AFTERNOON_PLACEHOLDER}\n- Evening: {EVENING_PLACEHOLDER}\n\n"
        );
    }

    text.push_str("## Estimated Budget\n");
    let _ = writeln!(
        text,
        "Total estimated cost: {currency} {:.2}",
        request.budget * DEFAULT_COST_RATIO
    );

    text
}
