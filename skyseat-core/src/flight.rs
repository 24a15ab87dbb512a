use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A place paired with the scheduled time at that place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePlace {
    pub place: String,
    pub time: DateTime<Utc>,
}

impl TimePlace {
    pub fn new(place: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            place: place.into(),
            time,
        }
    }
}

/// Seats held by one passenger on one flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub passenger_email: String,
    pub number_of_seats: u32,
}

/// Flight aggregate. Seat accounting is only reachable through
/// `make_booking` and `cancel_booking`, which keep
/// `remaining_seats + sum(bookings) == total_seats` at all times.
/// Not `Deserialize`: stored snapshots come back through `restore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flight {
    id: Uuid,
    airline: String,
    price_amount: i32,
    price_currency: String,
    departure: TimePlace,
    arrival: TimePlace,
    total_seats: u32,
    remaining_seats: u32,
    bookings: Vec<Booking>,
}

impl Flight {
    /// Create a flight at full capacity with no bookings
    pub fn new(
        airline: impl Into<String>,
        price_amount: i32,
        price_currency: impl Into<String>,
        departure: TimePlace,
        arrival: TimePlace,
        total_seats: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            airline: airline.into(),
            price_amount,
            price_currency: price_currency.into(),
            departure,
            arrival,
            total_seats,
            remaining_seats: total_seats,
            bookings: Vec::new(),
        }
    }

    /// Rebuild a flight from a stored snapshot.
    ///
    /// Fails if the snapshot does not balance, or holds two bookings for the
    /// same passenger, or a booking of zero seats.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        airline: String,
        price_amount: i32,
        price_currency: String,
        departure: TimePlace,
        arrival: TimePlace,
        total_seats: u32,
        remaining_seats: u32,
        bookings: Vec<Booking>,
    ) -> CoreResult<Self> {
        let flight = Self {
            id,
            airline,
            price_amount,
            price_currency,
            departure,
            arrival,
            total_seats,
            remaining_seats,
            bookings,
        };

        if flight.bookings.iter().any(|b| b.number_of_seats == 0) {
            return Err(CoreError::Validation(format!("flight {} has an empty booking", id)));
        }

        for (i, booking) in flight.bookings.iter().enumerate() {
            if flight.bookings[..i].iter().any(|b| b.passenger_email == booking.passenger_email) {
                return Err(CoreError::Validation(format!(
                    "flight {} has duplicate bookings for one passenger",
                    id
                )));
            }
        }

        if !flight.seats_balanced() {
            return Err(CoreError::Validation(format!(
                "flight {} seat accounting is inconsistent: {} remaining + {} booked != {} total",
                id,
                flight.remaining_seats,
                flight.booked_seats(),
                flight.total_seats
            )));
        }

        Ok(flight)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn airline(&self) -> &str {
        &self.airline
    }

    pub fn price_amount(&self) -> i32 {
        self.price_amount
    }

    pub fn price_currency(&self) -> &str {
        &self.price_currency
    }

    pub fn departure(&self) -> &TimePlace {
        &self.departure
    }

    pub fn arrival(&self) -> &TimePlace {
        &self.arrival
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn remaining_seats(&self) -> u32 {
        self.remaining_seats
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// Seats held by `passenger_email`, if any
    pub fn booking_for(&self, passenger_email: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.passenger_email == passenger_email)
    }

    pub fn booked_seats(&self) -> u64 {
        self.bookings.iter().map(|b| u64::from(b.number_of_seats)).sum()
    }

    pub fn seats_balanced(&self) -> bool {
        u64::from(self.remaining_seats) + self.booked_seats() == u64::from(self.total_seats)
    }

    /// Reserve `number_of_seats` for a passenger.
    ///
    /// A passenger who already holds seats has the request added to their
    /// existing booking. Nothing changes on error.
    pub fn make_booking(&mut self, passenger_email: &str, number_of_seats: u32) -> CoreResult<()> {
        if number_of_seats == 0 {
            return Err(CoreError::Validation("at least one seat must be booked".to_string()));
        }

        if number_of_seats > self.remaining_seats {
            return Err(CoreError::Overbook {
                requested: number_of_seats,
                remaining: self.remaining_seats,
            });
        }

        match self.bookings.iter_mut().find(|b| b.passenger_email == passenger_email) {
            Some(existing) => existing.number_of_seats += number_of_seats,
            None => self.bookings.push(Booking {
                passenger_email: passenger_email.to_string(),
                number_of_seats,
            }),
        }

        self.remaining_seats -= number_of_seats;
        Ok(())
    }

    /// Return `number_of_seats` from a passenger's booking to the pool.
    ///
    /// Cancelling more seats than the passenger holds is rejected as
    /// `NotFound`, never clamped. The booking is dropped once it reaches zero.
    pub fn cancel_booking(&mut self, passenger_email: &str, number_of_seats: u32) -> CoreResult<()> {
        if number_of_seats == 0 {
            return Err(CoreError::Validation("at least one seat must be cancelled".to_string()));
        }

        let position = self
            .bookings
            .iter()
            .position(|b| b.passenger_email == passenger_email)
            .ok_or_else(|| CoreError::NotFound(format!("no booking on flight {}", self.id)))?;

        let held = self.bookings[position].number_of_seats;
        if number_of_seats > held {
            return Err(CoreError::NotFound(format!(
                "booking on flight {} holds {} seats, cannot cancel {}",
                self.id, held, number_of_seats
            )));
        }

        if held == number_of_seats {
            self.bookings.remove(position);
        } else {
            self.bookings[position].number_of_seats = held - number_of_seats;
        }

        self.remaining_seats += number_of_seats;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn flight(total_seats: u32) -> Flight {
        let now = Utc::now();
        Flight::new(
            "American Airlines",
            1200,
            "USD",
            TimePlace::new("Los Angeles", now + Duration::hours(1)),
            TimePlace::new("Istanbul", now + Duration::hours(9)),
            total_seats,
        )
    }

    #[test]
    fn test_new_flight_is_at_full_capacity() {
        let flight = flight(853);
        assert_eq!(flight.remaining_seats(), 853);
        assert!(flight.bookings().is_empty());
        assert!(flight.seats_balanced());
    }

    #[test]
    fn test_booking_scenario() {
        let mut flight = flight(853);

        flight.make_booking("p1@x.com", 300).unwrap();
        assert_eq!(flight.remaining_seats(), 553);

        let result = flight.make_booking("p2@x.com", 600);
        assert!(matches!(result, Err(CoreError::Overbook { requested: 600, remaining: 553 })));
        assert_eq!(flight.remaining_seats(), 553);
        assert!(flight.booking_for("p2@x.com").is_none());

        flight.cancel_booking("p1@x.com", 300).unwrap();
        assert_eq!(flight.remaining_seats(), 853);
        assert!(flight.booking_for("p1@x.com").is_none());
        assert!(flight.bookings().is_empty());
    }

    #[test]
    fn test_overbook_leaves_flight_unchanged() {
        let mut flight = flight(3);
        flight.make_booking("a@x.com", 2).unwrap();
        let before = flight.clone();

        let result = flight.make_booking("b@x.com", 2);

        assert!(matches!(result, Err(CoreError::Overbook { requested: 2, remaining: 1 })));
        assert_eq!(flight, before);
    }

    #[test]
    fn test_repeat_booking_accumulates() {
        let mut flight = flight(10);
        flight.make_booking("a@x.com", 1).unwrap();
        flight.make_booking("a@x.com", 2).unwrap();

        assert_eq!(flight.bookings().len(), 1);
        assert_eq!(flight.booking_for("a@x.com").unwrap().number_of_seats, 3);
        assert_eq!(flight.remaining_seats(), 7);
    }

    #[test]
    fn test_book_then_cancel_restores_start_state() {
        let mut flight = flight(10);
        flight.make_booking("other@x.com", 4).unwrap();
        let start = flight.clone();

        flight.make_booking("a@x.com", 2).unwrap();
        flight.cancel_booking("a@x.com", 2).unwrap();

        assert_eq!(flight, start);
    }

    #[test]
    fn test_partial_cancel_keeps_booking() {
        let mut flight = flight(10);
        flight.make_booking("a@x.com", 5).unwrap();
        flight.cancel_booking("a@x.com", 3).unwrap();

        assert_eq!(flight.booking_for("a@x.com").unwrap().number_of_seats, 2);
        assert_eq!(flight.remaining_seats(), 8);
    }

    #[test]
    fn test_cancel_more_than_held_is_rejected() {
        let mut flight = flight(10);
        flight.make_booking("a@x.com", 2).unwrap();
        let before = flight.clone();

        let result = flight.cancel_booking("a@x.com", 3);

        assert!(matches!(result, Err(CoreError::NotFound(_))));
        assert_eq!(flight, before);
        assert!(flight.remaining_seats() <= flight.total_seats());
    }

    #[test]
    fn test_cancel_unknown_passenger() {
        let mut flight = flight(10);
        let result = flight.cancel_booking("ghost@x.com", 1);
        assert!(matches!(result, Err(CoreError::NotFound(_))));
        assert_eq!(flight.remaining_seats(), 10);
    }

    #[test]
    fn test_zero_seats_rejected() {
        let mut flight = flight(10);
        assert!(matches!(flight.make_booking("a@x.com", 0), Err(CoreError::Validation(_))));
        assert!(matches!(flight.cancel_booking("a@x.com", 0), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_restore_rejects_unbalanced_snapshot() {
        let original = flight(10);
        let result = Flight::restore(
            original.id(),
            original.airline().to_string(),
            original.price_amount(),
            original.price_currency().to_string(),
            original.departure().clone(),
            original.arrival().clone(),
            10,
            9,
            vec![Booking { passenger_email: "a@x.com".to_string(), number_of_seats: 2 }],
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_random_sequences_keep_invariant() {
        let mut rng = StdRng::seed_from_u64(853);
        let passengers = ["a@x.com", "b@x.com", "c@x.com", "d@x.com"];

        for _ in 0..50 {
            let mut flight = flight(rng.gen_range(1..=40));

            for _ in 0..200 {
                let email = passengers[rng.gen_range(0..passengers.len())];
                let seats = rng.gen_range(1..=6u32);
                let before = flight.clone();

                let result = if rng.gen_bool(0.6) {
                    flight.make_booking(email, seats)
                } else {
                    flight.cancel_booking(email, seats)
                };

                if result.is_err() {
                    assert_eq!(flight, before);
                }
                assert!(flight.seats_balanced());
                assert!(flight.remaining_seats() <= flight.total_seats());
            }
        }
    }
}
