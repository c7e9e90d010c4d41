//! Itinerary generation pipeline
//!
//! `CollectingInputs -> BuildingContext -> Generating -> Parsing -> Done`.
//! A failed model call moves to `Fallback`, which produces templated text and
//! continues with `Parsing`, so generation problems never reach the caller.
//! The only error surfaced is missing flight or hotel candidates.

pub mod context;
pub mod fallback;
pub mod parser;

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::llm::{ChatMessage, ChatRequest, TextGenerator};
use crate::models::{
    AlternativeHotel, FlightOption, GenerationSource, HotelOption, Itinerary, PointOfInterest,
    TravelRequest,
};
use crate::{NomadError, Result};

pub use context::{PlanningContext, SYSTEM_PROMPT};
pub use fallback::fallback_itinerary;
pub use parser::{ItineraryParser, ParsedItinerary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningStage {
    CollectingInputs,
    BuildingContext,
    Generating,
    Fallback,
    Parsing,
    Done,
}

impl fmt::Display for PlanningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanningStage::CollectingInputs => "collecting_inputs",
            PlanningStage::BuildingContext => "building_context",
            PlanningStage::Generating => "generating",
            PlanningStage::Fallback => "fallback",
            PlanningStage::Parsing => "parsing",
            PlanningStage::Done => "done",
        };
        f.write_str(name)
    }
}

pub struct ItineraryPlanner {
    generator: Arc<dyn TextGenerator>,
    parser: ItineraryParser,
    currency: String,
    temperature: f32,
    alternative_hotels: usize,
}

impl ItineraryPlanner {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &PlannerConfig) -> Result<Self> {
        Ok(Self {
            generator,
            parser: ItineraryParser::new(&config.currency)?,
            currency: config.currency.clone(),
            temperature: config.temperature,
            alternative_hotels: config.alternative_hotels,
        })
    }

    /// Turns a request and its candidate lists into an itinerary.
    ///
    /// Fails with `NotFound` when there are no flights or no hotels; that check
    /// happens before the model is contacted.
    #[instrument(skip_all, fields(origin = %request.origin, destination = %request.destination))]
    pub async fn create_itinerary(
        &self,
        request: &TravelRequest,
        flights: Vec<FlightOption>,
        hotels: Vec<HotelOption>,
        pois: Vec<PointOfInterest>,
    ) -> Result<Itinerary> {
        debug!(stage = %PlanningStage::CollectingInputs);
        if flights.is_empty() {
            return Err(NomadError::not_found(format!(
                "No flights found from {} to {}",
                request.origin, request.destination
            )));
        }
        if hotels.is_empty() {
            return Err(NomadError::not_found(format!(
                "No hotels found in {}",
                request.destination
            )));
        }

        debug!(stage = %PlanningStage::BuildingContext);
        let context = PlanningContext::build(request, &flights, &hotels, &pois);

        let (text, source) = self.generate_text(request, &context).await;

        debug!(stage = %PlanningStage::Parsing);
        let mut flights = flights.into_iter();
        let mut hotels = hotels.into_iter();
        let selected_flight = flights.next();
        let selected_hotel = hotels.next();
        let alternative_hotels: Vec<AlternativeHotel> = hotels
            .take(self.alternative_hotels)
            .map(|hotel| AlternativeHotel::from(&hotel))
            .collect();

        let parsed = self.parser.parse(
            &text,
            request,
            selected_hotel.as_ref().map(|hotel| hotel.name.as_str()),
        );

        let itinerary = Itinerary {
            request_id: Uuid::new_v4().to_string(),
            travel_request: request.clone(),
            selected_flight,
            selected_hotel,
            alternative_hotels,
            points_of_interest: pois,
            daily_plan: parsed.daily_plan,
            summary: parsed.summary,
            total_cost: parsed.total_cost,
            raw_itinerary: Some(text),
            source,
            created_at: Utc::now(),
        };

        let missing = itinerary.missing_days();
        if !missing.is_empty() {
            debug!("Days without a header in the generated text: {:?}", missing);
        }
        info!(
            stage = %PlanningStage::Done,
            request_id = %itinerary.request_id,
            days = itinerary.daily_plan.len(),
            ?source,
            "Itinerary ready"
        );
        Ok(itinerary)
    }

    /// Single model call; any failure is logged and replaced by the template.
    async fn generate_text(
        &self,
        request: &TravelRequest,
        context: &PlanningContext<'_>,
    ) -> (String, GenerationSource) {
        debug!(stage = %PlanningStage::Generating);
        let user_message = match context.user_message(&self.currency) {
            Ok(message) => message,
            Err(err) => {
                warn!("Could not serialize planning context: {}", err);
                return self.fallback(request);
            }
        };

        let chat = ChatRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_message),
            ],
            temperature: self.temperature,
        };

        match self.generator.generate(&chat).await {
            Ok(text) => (text, GenerationSource::Model),
            Err(err) => {
                warn!("Error generating itinerary with the model: {}", err);
                self.fallback(request)
            }
        }
    }

    fn fallback(&self, request: &TravelRequest) -> (String, GenerationSource) {
        debug!(stage = %PlanningStage::Fallback);
        (
            fallback_itinerary(request, &self.currency),
            GenerationSource::Fallback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(NomadError::api("quota exceeded"))
        }
    }

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, request: &ChatRequest) -> Result<String> {
            assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
            Ok(self.0.to_string())
        }
    }

    fn request(budget: f64) -> TravelRequest {
        TravelRequest {
            origin: "SIN".into(),
            destination: "PAR".into(),
            depart_date: "2025-09-01".parse().unwrap(),
            return_date: "2025-09-03".parse().unwrap(),
            budget,
            preferences: vec!["Food".into()],
        }
    }

    fn flight() -> FlightOption {
        FlightOption {
            airline: "AF".into(),
            price: 900.0,
            origin: "SIN".into(),
            destination: "PAR".into(),
            depart_date: "2025-09-01".parse().unwrap(),
            return_date: "2025-09-03".parse().unwrap(),
            flight_number: Some("AF257".into()),
            departure_time: None,
            arrival_time: None,
        }
    }

    fn hotel(name: &str) -> HotelOption {
        HotelOption {
            name: name.into(),
            price_per_night: 150.0,
            stars: 4.0,
            city: "PAR".into(),
            address: None,
            hotel_id: None,
            chain_code: None,
            distance: None,
            amenities: None,
            description: None,
            image_url: None,
        }
    }

    fn planner(generator: Arc<dyn TextGenerator>) -> ItineraryPlanner {
        ItineraryPlanner::new(generator, &PlannerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_no_flights_is_not_found_before_generation() {
        let generator = Arc::new(FailingGenerator {
            calls: AtomicUsize::new(0),
        });
        let planner = planner(generator.clone());

        let err = planner
            .create_itinerary(&request(2000.0), vec![], vec![hotel("Le Meurice")], vec![])
            .await
            .unwrap_err();

        assert!(matches!(err, NomadError::NotFound { .. }));
        assert!(err.to_string().contains("SIN to PAR"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_hotels_is_not_found() {
        let planner = planner(Arc::new(CannedGenerator("unused")));
        let err = planner
            .create_itinerary(&request(2000.0), vec![flight()], vec![], vec![])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No hotels found in PAR"));
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back() {
        let generator = Arc::new(FailingGenerator {
            calls: AtomicUsize::new(0),
        });
        let planner = planner(generator.clone());

        let itinerary = planner
            .create_itinerary(&request(2000.0), vec![flight()], vec![hotel("Le Meurice")], vec![])
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(itinerary.source, GenerationSource::Fallback);
        assert_eq!(itinerary.daily_plan.len(), 3);
        assert_eq!(itinerary.total_cost, 1800.0);
        assert_eq!(itinerary.summary, "# Trip to PAR");
        for (idx, day) in itinerary.daily_plan.iter().enumerate() {
            assert_eq!(day.day as usize, idx + 1);
            assert_eq!(day.morning.as_deref(), Some(fallback::MORNING_PLACEHOLDER));
            assert_eq!(day.afternoon.as_deref(), Some(fallback::AFTERNOON_PLACEHOLDER));
            assert_eq!(day.evening.as_deref(), Some(fallback::EVENING_PLACEHOLDER));
            assert_eq!(day.accommodation.as_deref(), Some("Le Meurice"));
        }
        assert!(itinerary.missing_days().is_empty());
    }

    #[tokio::test]
    async fn test_model_text_is_parsed_and_candidates_selected() {
        let text = "Three days of Paris food.\n\n\
                    ### Day 1\nMorning: Arrive\nEvening: Bistro\n\
                    ### Day 3\nMorning: Market\n\n\
                    Total Cost: SGD 1,250.50";
        let planner = planner(Arc::new(CannedGenerator(text)));

        let hotels = vec![
            hotel("Le Meurice"),
            hotel("Hotel A"),
            hotel("Hotel B"),
            hotel("Hotel C"),
            hotel("Hotel D"),
        ];
        let itinerary = planner
            .create_itinerary(&request(2000.0), vec![flight()], hotels, vec![])
            .await
            .unwrap();

        assert_eq!(itinerary.source, GenerationSource::Model);
        assert_eq!(itinerary.summary, "Three days of Paris food.");
        assert_eq!(itinerary.total_cost, 1250.50);
        assert_eq!(itinerary.selected_hotel.as_ref().unwrap().name, "Le Meurice");
        assert_eq!(itinerary.selected_flight.as_ref().unwrap().airline, "AF");
        assert_eq!(itinerary.alternative_hotels.len(), 3);
        assert_eq!(itinerary.alternative_hotels[0].name, "Hotel A");

        let days: Vec<u32> = itinerary.daily_plan.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 3]);
        assert_eq!(itinerary.missing_days(), vec![2]);
        assert_eq!(itinerary.daily_plan[0].evening.as_deref(), Some("Bistro"));
        assert!(Uuid::parse_str(&itinerary.request_id).is_ok());
    }
}
