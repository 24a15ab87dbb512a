use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyseat_core::{Flight, PassengerBooking, TimePlace, VersionedFlight};
use uuid::Uuid;
use crate::error::AppError;

/// Booking and cancellation request body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookDto {
    pub flight_id: Uuid,
    pub passenger_email: String,
    /// One request moves at most 255 seats
    pub number_of_seats: u8,
}

impl BookDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let email = self.passenger_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::ValidationError("passenger_email must be an email address".to_string()));
        }
        if self.number_of_seats == 0 {
            return Err(AppError::ValidationError("number_of_seats must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn email(&self) -> &str {
        self.passenger_email.trim()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimePlaceRm {
    pub place: String,
    pub time: DateTime<Utc>,
}

impl From<&TimePlace> for TimePlaceRm {
    fn from(tp: &TimePlace) -> Self {
        Self {
            place: tp.place.clone(),
            time: tp.time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlightRm {
    pub id: Uuid,
    pub airline: String,
    pub price: String,
    pub departure: TimePlaceRm,
    pub arrival: TimePlaceRm,
    pub total_seats: u32,
    pub remaining_number_of_seats: u32,
    pub version: i64,
}

impl From<&VersionedFlight> for FlightRm {
    fn from(vf: &VersionedFlight) -> Self {
        let f = &vf.flight;
        Self {
            id: f.id(),
            airline: f.airline().to_string(),
            price: price_label(f),
            departure: f.departure().into(),
            arrival: f.arrival().into(),
            total_seats: f.total_seats(),
            remaining_number_of_seats: f.remaining_seats(),
            version: vf.version.0,
        }
    }
}

/// One passenger's booking, flattened with its flight
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingRm {
    pub flight_id: Uuid,
    pub airline: String,
    pub price: String,
    pub departure: TimePlaceRm,
    pub arrival: TimePlaceRm,
    pub number_of_booked_seats: u32,
    pub passenger_email: String,
}

impl BookingRm {
    pub fn new(booking: &PassengerBooking, passenger_email: &str) -> Self {
        let f = &booking.flight;
        Self {
            flight_id: f.id(),
            airline: f.airline().to_string(),
            price: price_label(f),
            departure: f.departure().into(),
            arrival: f.arrival().into(),
            number_of_booked_seats: booking.number_of_seats,
            passenger_email: passenger_email.to_string(),
        }
    }
}

fn price_label(f: &Flight) -> String {
    format!("{} {}", f.price_amount(), f.price_currency())
}
