use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingChangeKind {
    Booked,
    Cancelled,
}

/// Published once a booking or cancellation has been committed.
/// Carries no passenger data: subscribers are anonymous.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingChangedEvent {
    pub flight_id: Uuid,
    pub kind: BookingChangeKind,
    pub seats: u32,
    pub remaining_seats: u32,
    pub version: i64,
    pub occurred_at: i64,
}

impl BookingChangedEvent {
    pub fn now(flight_id: Uuid, kind: BookingChangeKind, seats: u32, remaining_seats: u32, version: i64) -> Self {
        Self {
            flight_id,
            kind,
            seats,
            remaining_seats,
            version,
            occurred_at: Utc::now().timestamp(),
        }
    }
}
