//! Journey store and attribution sink traits, plus an in-memory store
//!
//! The engine never talks to persistence directly. A [`JourneySource`]
//! hands it journey snapshots and an [`AttributionSink`] accepts the
//! generated rows back.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use touchline_core::{Journey, JourneyId, ModelResults, Touchpoint};

use crate::error::Result;

/// Supplies ordered journey snapshots
#[async_trait]
pub trait JourneySource: Send + Sync {
    /// IDs of every journey currently known to the store
    async fn journey_ids(&self) -> Result<Vec<JourneyId>>;

    /// Snapshot of one journey, `None` if it no longer exists
    async fn load_journey(&self, id: JourneyId) -> Result<Option<Journey>>;
}

/// Accepts attribution results for persistence
#[async_trait]
pub trait AttributionSink: Send + Sync {
    /// Replace the stored results for a journey
    async fn store_results(&self, journey_id: JourneyId, results: &ModelResults) -> Result<()>;

    /// Most recently stored results for a journey
    async fn results_for(&self, journey_id: JourneyId) -> Result<Option<ModelResults>>;
}

/// In-memory implementation of both store traits for tests and fixtures
pub struct InMemoryJourneyStore {
    /// Touchpoints by journey, in insertion order
    touchpoints: RwLock<BTreeMap<JourneyId, Vec<Touchpoint>>>,
    /// Last stored attribution results by journey
    results: RwLock<HashMap<JourneyId, ModelResults>>,
}

impl InMemoryJourneyStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            touchpoints: RwLock::new(BTreeMap::new()),
            results: RwLock::new(HashMap::new()),
        }
    }

    /// Record a touchpoint under its journey
    pub async fn record(&self, touchpoint: Touchpoint) {
        self.touchpoints
            .write()
            .await
            .entry(touchpoint.journey_id)
            .or_default()
            .push(touchpoint);
    }

    /// Record several touchpoints
    pub async fn record_all(&self, touchpoints: impl IntoIterator<Item = Touchpoint>) {
        let mut guard = self.touchpoints.write().await;
        for touchpoint in touchpoints {
            guard.entry(touchpoint.journey_id).or_default().push(touchpoint);
        }
    }

    /// Delete a journey together with its touchpoints and results
    ///
    /// Returns the number of touchpoints removed.
    pub async fn delete_journey(&self, id: JourneyId) -> usize {
        self.results.write().await.remove(&id);
        self.touchpoints
            .write()
            .await
            .remove(&id)
            .map(|tps| tps.len())
            .unwrap_or(0)
    }

    /// Number of journeys in the store
    pub async fn len(&self) -> usize {
        self.touchpoints.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.touchpoints.read().await.is_empty()
    }
}

impl Default for InMemoryJourneyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JourneySource for InMemoryJourneyStore {
    async fn journey_ids(&self) -> Result<Vec<JourneyId>> {
        Ok(self.touchpoints.read().await.keys().copied().collect())
    }

    async fn load_journey(&self, id: JourneyId) -> Result<Option<Journey>> {
        Ok(self
            .touchpoints
            .read()
            .await
            .get(&id)
            .map(|tps| Journey::new(id, tps.clone())))
    }
}

#[async_trait]
impl AttributionSink for InMemoryJourneyStore {
    async fn store_results(&self, journey_id: JourneyId, results: &ModelResults) -> Result<()> {
        self.results
            .write()
            .await
            .insert(journey_id, results.clone());
        Ok(())
    }

    async fn results_for(&self, journey_id: JourneyId) -> Result<Option<ModelResults>> {
        Ok(self.results.read().await.get(&journey_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use touchline_core::{AttributionEngine, ModelType};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_snapshot_is_ordered() {
        let store = InMemoryJourneyStore::new();
        let id = Uuid::now_v7();
        let now = Utc::now();
        store
            .record(Touchpoint::new(id, "website", "conversion", now))
            .await;
        store
            .record(Touchpoint::new(id, "email", "click", now - Duration::days(2)))
            .await;

        let journey = store.load_journey(id).await.unwrap().unwrap();
        assert_eq!(journey.touchpoints()[0].channel, "email");
        assert_eq!(store.journey_ids().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn test_snapshot_unaffected_by_later_writes() {
        let store = InMemoryJourneyStore::new();
        let id = Uuid::now_v7();
        store
            .record(Touchpoint::new(id, "email", "click", Utc::now()))
            .await;

        let snapshot = store.load_journey(id).await.unwrap().unwrap();
        store
            .record(Touchpoint::new(id, "website", "conversion", Utc::now()))
            .await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.load_journey(id).await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_journey_is_none() {
        let store = InMemoryJourneyStore::new();
        assert!(store.load_journey(Uuid::now_v7()).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_results() {
        let store = InMemoryJourneyStore::new();
        let id = Uuid::now_v7();
        let now = Utc::now();
        store
            .record_all(vec![
                Touchpoint::new(id, "email", "click", now - Duration::days(1)),
                Touchpoint::new(id, "website", "conversion", now),
            ])
            .await;

        let journey = store.load_journey(id).await.unwrap().unwrap();
        let results = AttributionEngine::default()
            .generate_attribution_models(&journey, &[ModelType::Linear]);
        store.store_results(id, &results).await.unwrap();
        assert!(store.results_for(id).await.unwrap().is_some());

        assert_eq!(store.delete_journey(id).await, 2);
        assert!(store.results_for(id).await.unwrap().is_none());
        assert!(store.load_journey(id).await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }
}
