use async_trait::async_trait;
use skyseat_core::{CommitOutcome, Flight, FlightStore, StoreError, Version, VersionedFlight};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Process-local flight store.
///
/// Readers always get their own clone; the compare-and-swap happens under
/// the write lock so a stale snapshot can never overwrite a newer one.
#[derive(Default)]
pub struct InMemoryFlightStore {
    flights: RwLock<HashMap<Uuid, VersionedFlight>>,
}

impl InMemoryFlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.flights.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flights.read().await.is_empty()
    }
}

#[async_trait]
impl FlightStore for InMemoryFlightStore {
    async fn read(&self, id: Uuid) -> Result<Option<VersionedFlight>, StoreError> {
        Ok(self.flights.read().await.get(&id).cloned())
    }

    async fn conditional_write(
        &self,
        flight: &Flight,
        expected: Version,
    ) -> Result<CommitOutcome, StoreError> {
        let mut flights = self.flights.write().await;

        let Some(stored) = flights.get_mut(&flight.id()) else {
            return Ok(CommitOutcome::VersionConflict);
        };

        if stored.version != expected {
            debug!(flight_id = %flight.id(), expected = expected.0, actual = stored.version.0, "Rejecting stale write");
            return Ok(CommitOutcome::VersionConflict);
        }

        stored.flight = flight.clone();
        stored.version = expected.next();
        Ok(CommitOutcome::Committed(stored.version))
    }

    async fn insert(&self, flight: &Flight) -> Result<Version, StoreError> {
        let mut flights = self.flights.write().await;
        if flights.contains_key(&flight.id()) {
            return Err(StoreError::Duplicate(flight.id()));
        }

        flights.insert(
            flight.id(),
            VersionedFlight {
                flight: flight.clone(),
                version: Version::INITIAL,
            },
        );
        Ok(Version::INITIAL)
    }

    async fn list(&self) -> Result<Vec<VersionedFlight>, StoreError> {
        let mut flights: Vec<_> = self.flights.read().await.values().cloned().collect();
        flights.sort_by_key(|f| f.flight.departure().time);
        Ok(flights)
    }
}
