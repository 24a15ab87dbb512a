use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::flight::Flight;
use crate::StoreError;

/// Opaque concurrency token. Every committed write moves it forward by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub i64);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }
}

/// A flight snapshot together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedFlight {
    pub flight: Flight,
    pub version: Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Stored; carries the version now attached to the flight
    Committed(Version),
    /// Someone else committed since the snapshot was read
    VersionConflict,
}

/// Durable storage for flight aggregates.
///
/// Implementations must make `conditional_write` atomic: the seat count and
/// the bookings are replaced together, and only when the stored version
/// still equals `expected`.
#[async_trait]
pub trait FlightStore: Send + Sync {
    async fn read(&self, id: Uuid) -> Result<Option<VersionedFlight>, StoreError>;

    async fn conditional_write(
        &self,
        flight: &Flight,
        expected: Version,
    ) -> Result<CommitOutcome, StoreError>;

    /// Store a brand new flight at `Version::INITIAL`
    async fn insert(&self, flight: &Flight) -> Result<Version, StoreError>;

    async fn list(&self) -> Result<Vec<VersionedFlight>, StoreError>;
}
