//! Per-user itinerary storage
//!
//! Lists are kept in save order; re-saving an itinerary with a known
//! `request_id` replaces it in place.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::Result;
use crate::models::Itinerary;

#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    async fn save(&self, user_id: &str, itinerary: Itinerary) -> Result<()>;

    /// Every itinerary saved by `user_id`, oldest first
    async fn list_for(&self, user_id: &str) -> Result<Vec<Itinerary>>;

    /// A single itinerary, only if it belongs to `user_id`
    async fn find(&self, user_id: &str, request_id: &str) -> Result<Option<Itinerary>>;
}

#[derive(Default)]
pub struct InMemoryItineraryRepository {
    itineraries: Mutex<HashMap<String, Vec<Itinerary>>>,
}

impl InMemoryItineraryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItineraryRepository for InMemoryItineraryRepository {
    async fn save(&self, user_id: &str, itinerary: Itinerary) -> Result<()> {
        let mut itineraries = self.itineraries.lock();
        let saved = itineraries.entry(user_id.to_string()).or_default();
        match saved
            .iter_mut()
            .find(|existing| existing.request_id == itinerary.request_id)
        {
            Some(existing) => *existing = itinerary,
            None => saved.push(itinerary),
        }
        debug!("User {} has {} saved itineraries", user_id, saved.len());
        Ok(())
    }

    async fn list_for(&self, user_id: &str) -> Result<Vec<Itinerary>> {
        Ok(self
            .itineraries
            .lock()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find(&self, user_id: &str, request_id: &str) -> Result<Option<Itinerary>> {
        Ok(self.itineraries.lock().get(user_id).and_then(|saved| {
            saved
                .iter()
                .find(|itinerary| itinerary.request_id == request_id)
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationSource, TravelRequest};
    use chrono::Utc;

    fn itinerary(request_id: &str, summary: &str) -> Itinerary {
        Itinerary {
            request_id: request_id.into(),
            travel_request: TravelRequest {
                origin: "SIN".into(),
                destination: "BKK".into(),
                depart_date: "2025-06-01".parse().unwrap(),
                return_date: "2025-06-03".parse().unwrap(),
                budget: 800.0,
                preferences: vec![],
            },
            selected_flight: None,
            selected_hotel: None,
            alternative_hotels: vec![],
            points_of_interest: vec![],
            daily_plan: vec![],
            summary: summary.into(),
            total_cost: 720.0,
            raw_itinerary: None,
            source: GenerationSource::Fallback,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_users_only_see_their_own_itineraries() {
        let repo = InMemoryItineraryRepository::new();
        repo.save("alice", itinerary("a-1", "first")).await.unwrap();
        repo.save("alice", itinerary("a-2", "second")).await.unwrap();
        repo.save("bob", itinerary("b-1", "bob's")).await.unwrap();

        let alice: Vec<String> = repo
            .list_for("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.request_id)
            .collect();
        assert_eq!(alice, vec!["a-1", "a-2"]);

        assert!(repo.find("bob", "a-1").await.unwrap().is_none());
        assert_eq!(repo.find("bob", "b-1").await.unwrap().unwrap().summary, "bob's");
        assert!(repo.list_for("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resave_replaces_in_place() {
        let repo = InMemoryItineraryRepository::new();
        repo.save("alice", itinerary("a-1", "draft")).await.unwrap();
        repo.save("alice", itinerary("a-2", "other")).await.unwrap();
        repo.save("alice", itinerary("a-1", "final")).await.unwrap();

        let saved = repo.list_for("alice").await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].request_id, "a-1");
        assert_eq!(saved[0].summary, "final");
    }
}
