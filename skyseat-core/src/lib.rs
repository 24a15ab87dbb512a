pub mod flight;
pub mod repository;
pub mod search;
pub mod service;

pub use flight::{Booking, Flight, TimePlace};
pub use repository::{CommitOutcome, FlightStore, Version, VersionedFlight};
pub use search::FlightSearchParameters;
pub use service::{BookingReceipt, BookingService, PassengerBooking, RetryPolicy};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Overbooked: requested {requested} seats, {remaining} remaining")]
    Overbook {
        requested: u32,
        remaining: u32,
    },
    #[error("Flight {flight_id} was modified concurrently, gave up after {attempts} attempts")]
    Concurrency {
        flight_id: Uuid,
        attempts: u32,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Only lost-update races are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Concurrency { .. })
    }
}

/// Failures raised by a `FlightStore` backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Flight {0} already exists")]
    Duplicate(Uuid),
    #[error("Stored flight {id} is corrupt: {reason}")]
    Corrupt {
        id: Uuid,
        reason: String,
    },
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type CoreResult<T> = Result<T, CoreError>;
