use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use skyseat_shared::Masked;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::flight::Flight;
use crate::repository::{CommitOutcome, FlightStore, Version, VersionedFlight};
use crate::search::FlightSearchParameters;
use crate::{CoreError, CoreResult};

/// How hard to try before giving up on a contended flight.
/// Built through `new`, which guarantees at least one attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    /// Wait `backoff * attempt` after each conflict
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(10))
    }
}

/// Result of a committed booking or cancellation
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub flight_id: Uuid,
    pub version: Version,
    pub remaining_seats: u32,
    /// Seats the passenger holds after the change
    pub held_seats: u32,
    pub attempts: u32,
}

/// One flight on which a passenger holds seats
#[derive(Debug, Clone)]
pub struct PassengerBooking {
    pub flight: Flight,
    pub number_of_seats: u32,
}

/// Entry point for callers: runs every seat mutation as a
/// read, mutate, conditional-write cycle against the store.
pub struct BookingService {
    store: Arc<dyn FlightStore>,
    policy: RetryPolicy,
}

impl BookingService {
    pub fn new(store: Arc<dyn FlightStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn get_flight(&self, flight_id: Uuid) -> CoreResult<VersionedFlight> {
        self.store
            .read(flight_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))
    }

    pub async fn create_flight(&self, flight: Flight) -> CoreResult<VersionedFlight> {
        let version = self.store.insert(&flight).await?;
        info!(flight_id = %flight.id(), total_seats = flight.total_seats(), "Flight created");
        Ok(VersionedFlight { flight, version })
    }

    pub async fn search(&self, params: &FlightSearchParameters) -> CoreResult<Vec<VersionedFlight>> {
        let flights = self.store.list().await?;
        Ok(flights.into_iter().filter(|f| params.matches(&f.flight)).collect())
    }

    /// Every flight where `passenger_email` currently holds seats
    pub async fn bookings_for(&self, passenger_email: &str) -> CoreResult<Vec<PassengerBooking>> {
        let flights = self.store.list().await?;

        Ok(flights
            .into_iter()
            .filter_map(|VersionedFlight { flight, .. }| {
                let seats = flight.booking_for(passenger_email)?.number_of_seats;
                Some(PassengerBooking { flight, number_of_seats: seats })
            })
            .collect())
    }

    pub async fn make_booking(
        &self,
        flight_id: Uuid,
        passenger_email: &str,
        number_of_seats: u32,
    ) -> CoreResult<BookingReceipt> {
        let receipt = self
            .commit_with_retry(flight_id, passenger_email, |flight| {
                flight.make_booking(passenger_email, number_of_seats)
            })
            .await?;

        info!(
            %flight_id,
            passenger = ?Masked(passenger_email),
            seats = number_of_seats,
            remaining = receipt.remaining_seats,
            attempts = receipt.attempts,
            "Booking committed"
        );
        Ok(receipt)
    }

    pub async fn cancel_booking(
        &self,
        flight_id: Uuid,
        passenger_email: &str,
        number_of_seats: u32,
    ) -> CoreResult<BookingReceipt> {
        let receipt = self
            .commit_with_retry(flight_id, passenger_email, |flight| {
                flight.cancel_booking(passenger_email, number_of_seats)
            })
            .await?;

        info!(
            %flight_id,
            passenger = ?Masked(passenger_email),
            seats = number_of_seats,
            remaining = receipt.remaining_seats,
            attempts = receipt.attempts,
            "Cancellation committed"
        );
        Ok(receipt)
    }

    async fn commit_with_retry<F>(
        &self,
        flight_id: Uuid,
        passenger_email: &str,
        mut mutate: F,
    ) -> CoreResult<BookingReceipt>
    where
        F: FnMut(&mut Flight) -> CoreResult<()> + Send,
    {
        for attempt in 1..=self.policy.max_attempts {
            let VersionedFlight { mut flight, version } = self.get_flight(flight_id).await?;

            // Business errors end the request; only lost updates loop.
            mutate(&mut flight)?;

            match self.store.conditional_write(&flight, version).await? {
                CommitOutcome::Committed(new_version) => {
                    return Ok(BookingReceipt {
                        flight_id,
                        version: new_version,
                        remaining_seats: flight.remaining_seats(),
                        held_seats: flight
                            .booking_for(passenger_email)
                            .map_or(0, |b| b.number_of_seats),
                        attempts: attempt,
                    });
                }
                CommitOutcome::VersionConflict => {
                    warn!(
                        %flight_id,
                        read_version = version.0,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "Flight changed since it was read"
                    );
                    if attempt < self.policy.max_attempts && !self.policy.backoff.is_zero() {
                        let delay = self.policy.backoff * attempt;
                        debug!(%flight_id, ?delay, "Backing off before retry");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(CoreError::Concurrency {
            flight_id,
            attempts: self.policy.max_attempts,
        })
    }
}
