//! Marker scanner turning generated markdown into structured days
//!
//! Recognised markers live in the tables below. A day whose header never
//! appears, or whose section is empty, is left out of the plan; nothing is
//! back-filled.

use regex::Regex;
use std::collections::BTreeMap;

use crate::models::{ItineraryDayActivity, TravelRequest};
use crate::{NomadError, Result};

/// Day header shapes as `(prefix, suffix)` around the day number, tried in
/// this order. The first shape present in the text wins.
pub const DAY_HEADER_MARKERS: [(&str, &str); 4] = [
    ("### Day ", ""),
    ("## Day ", ""),
    ("Day ", ":"),
    ("Day ", " -"),
];

pub const MORNING_MARKER: &str = "Morning:";
pub const AFTERNOON_MARKER: &str = "Afternoon:";
pub const EVENING_MARKER: &str = "Evening:";

/// Checked in order; only the first one present is used
pub const TOTAL_COST_MARKERS: [&str; 2] = ["Total cost:", "Total Cost:"];

const SUMMARY_FALLBACK_CHARS: usize = 200;

/// Share of the budget assumed when the text states no usable total
pub const DEFAULT_COST_RATIO: f64 = 0.9;

/// Structured pieces pulled out of one itinerary text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItinerary {
    pub daily_plan: Vec<ItineraryDayActivity>,
    pub total_cost: f64,
    pub summary: String,
}

pub struct ItineraryParser {
    cost_pattern: Regex,
}

impl ItineraryParser {
    /// `currency` is the only literal accepted in front of the total cost.
    pub fn new(currency: &str) -> Result<Self> {
        let pattern = format!(r"{}\s*([\d,]+(?:\.\d+)?)", regex::escape(currency.trim()));
        let cost_pattern = Regex::new(&pattern)
            .map_err(|e| NomadError::config(format!("Invalid currency literal '{currency}': {e}")))?;
        Ok(Self { cost_pattern })
    }

    pub fn parse(
        &self,
        text: &str,
        request: &TravelRequest,
        accommodation: Option<&str>,
    ) -> ParsedItinerary {
        let headers = DayHeaders::scan(text, request.duration());
        let mut daily_plan = Vec::new();

        for (day, content) in headers.sections(text) {
            let content = content.trim();
            if content.is_empty() {
                tracing::debug!("Day {} has a header but no content, leaving it out", day);
                continue;
            }

            daily_plan.push(ItineraryDayActivity {
                day,
                date: request.date_of_day(day),
                description: content.to_string(),
                morning: slot_value(content, MORNING_MARKER),
                afternoon: slot_value(content, AFTERNOON_MARKER),
                evening: slot_value(content, EVENING_MARKER),
                accommodation: accommodation.map(str::to_string),
            });
        }

        ParsedItinerary {
            daily_plan,
            total_cost: self
                .total_cost(text)
                .unwrap_or(request.budget * DEFAULT_COST_RATIO),
            summary: summary(text),
        }
    }

    /// Amount following the first total-cost marker, if one parses
    pub fn total_cost(&self, text: &str) -> Option<f64> {
        let after = TOTAL_COST_MARKERS
            .iter()
            .find_map(|marker| text.find(marker).map(|idx| &text[idx + marker.len()..]))?;

        let amount = self.cost_pattern.captures(after)?.get(1)?.as_str();
        amount.replace(',', "").parse().ok()
    }
}

/// One day header found in the text
#[derive(Debug, Clone, Copy)]
struct HeaderHit {
    day: u32,
    /// Index into [`DAY_HEADER_MARKERS`]
    shape: usize,
    start: usize,
    end: usize,
}

/// Every day header in a text, collected in one pass per header shape.
struct DayHeaders {
    /// All hits ordered by position
    hits: Vec<HeaderHit>,
    /// Header each day's section starts after: the first shape in
    /// [`DAY_HEADER_MARKERS`] present for that day, at its first occurrence
    chosen: BTreeMap<u32, HeaderHit>,
}

impl DayHeaders {
    fn scan(text: &str, duration: u32) -> Self {
        let mut hits = Vec::new();
        for (shape, (prefix, suffix)) in DAY_HEADER_MARKERS.iter().enumerate() {
            for (start, _) in text.match_indices(prefix) {
                let number_start = start + prefix.len();
                let digits = text[number_start..]
                    .bytes()
                    .take_while(u8::is_ascii_digit)
                    .count();
                let number_end = number_start + digits;
                let number = &text[number_start..number_end];
                if number.is_empty() || number.starts_with('0') {
                    continue;
                }
                let Ok(day) = number.parse::<u32>() else {
                    continue;
                };
                if day > duration || !text[number_end..].starts_with(suffix) {
                    continue;
                }
                hits.push(HeaderHit {
                    day,
                    shape,
                    start,
                    end: number_end + suffix.len(),
                });
            }
        }
        hits.sort_by_key(|hit| (hit.start, hit.shape));

        let mut chosen: BTreeMap<u32, HeaderHit> = BTreeMap::new();
        for hit in &hits {
            chosen
                .entry(hit.day)
                .and_modify(|current| {
                    if hit.shape < current.shape {
                        *current = *hit;
                    }
                })
                .or_insert(*hit);
        }
        Self { hits, chosen }
    }

    /// `(day, section)` in day order. A section runs from the end of the
    /// day's header to the earliest header of any later day, or to the end.
    fn sections<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (u32, &'a str)> + 'a {
        self.chosen.iter().map(move |(&day, header)| {
            let from = self.hits.partition_point(|hit| hit.start < header.end);
            let end = self.hits[from..]
                .iter()
                .find(|hit| hit.day > day)
                .map_or(text.len(), |hit| hit.start);
            (day, &text[header.end..end])
        })
    }
}

/// Rest of the line after `marker`, with markdown emphasis stripped.
/// A marker with nothing after it gives an empty string.
fn slot_value(content: &str, marker: &str) -> Option<String> {
    let idx = content.find(marker)?;
    let line = content[idx + marker.len()..].split('\n').next().unwrap_or_default();
    let value = line.trim_matches(|c: char| c == '*' || c.is_whitespace());
    Some(value.to_string())
}

fn summary(text: &str) -> String {
    match text.split_once("\n\n") {
        Some((head, _)) => head.to_string(),
        None => text.chars().take(SUMMARY_FALLBACK_CHARS).collect(),
    }
}
