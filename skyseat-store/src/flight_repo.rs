use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyseat_core::{
    Booking, CommitOutcome, CoreError, Flight, FlightStore, StoreError, TimePlace, Version,
    VersionedFlight,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Postgres-backed flight store. The `version` column is the concurrency
/// token; a conditional write only touches the row when it still matches.
pub struct PgFlightStore {
    pool: PgPool,
}

impl PgFlightStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    price_amount: i32,
    price_currency: String,
    departure_place: String,
    departure_time: DateTime<Utc>,
    arrival_place: String,
    arrival_time: DateTime<Utc>,
    total_seats: i32,
    remaining_seats: i32,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    flight_id: Uuid,
    passenger_email: String,
    number_of_seats: i32,
}

const SELECT_FLIGHT: &str = r#"
    SELECT id, airline, price_amount, price_currency,
           departure_place, departure_time, arrival_place, arrival_time,
           total_seats, remaining_seats, version
    FROM flights
"#;

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

fn seat_count(id: Uuid, value: i32, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        id,
        reason: format!("negative {}: {}", field, value),
    })
}

fn to_column(id: Uuid, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt {
        id,
        reason: format!("seat count {} does not fit the schema", value),
    })
}

impl FlightRow {
    fn into_versioned(self, bookings: Vec<BookingRow>) -> Result<VersionedFlight, StoreError> {
        let id = self.id;
        let bookings = bookings
            .into_iter()
            .map(|b| {
                Ok(Booking {
                    passenger_email: b.passenger_email,
                    number_of_seats: seat_count(id, b.number_of_seats, "booking seats")?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let flight = Flight::restore(
            id,
            self.airline,
            self.price_amount,
            self.price_currency,
            TimePlace::new(self.departure_place, self.departure_time),
            TimePlace::new(self.arrival_place, self.arrival_time),
            seat_count(id, self.total_seats, "total_seats")?,
            seat_count(id, self.remaining_seats, "remaining_seats")?,
            bookings,
        )
        .map_err(|e| match e {
            CoreError::Validation(reason) => StoreError::Corrupt { id, reason },
            other => StoreError::Corrupt { id, reason: other.to_string() },
        })?;

        Ok(VersionedFlight {
            flight,
            version: Version(self.version),
        })
    }
}

async fn write_bookings(
    tx: &mut Transaction<'_, Postgres>,
    flight: &Flight,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM bookings WHERE flight_id = $1")
        .bind(flight.id())
        .execute(&mut **tx)
        .await
        .map_err(backend)?;

    for (position, booking) in flight.bookings().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO bookings (flight_id, position, passenger_email, number_of_seats)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(flight.id())
        .bind(position as i32)
        .bind(&booking.passenger_email)
        .bind(to_column(flight.id(), booking.number_of_seats)?)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
    }

    Ok(())
}

#[async_trait]
impl FlightStore for PgFlightStore {
    async fn read(&self, id: Uuid) -> Result<Option<VersionedFlight>, StoreError> {
        // Snapshot both tables consistently
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let row = sqlx::query_as::<_, FlightRow>(&format!("{} WHERE id = $1", SELECT_FLIGHT))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let bookings = sqlx::query_as::<_, BookingRow>(
            "SELECT flight_id, passenger_email, number_of_seats FROM bookings WHERE flight_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        row.into_versioned(bookings).map(Some)
    }

    async fn conditional_write(
        &self,
        flight: &Flight,
        expected: Version,
    ) -> Result<CommitOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE flights
            SET remaining_seats = $1, version = version + 1
            WHERE id = $2 AND version = $3
            RETURNING version
            "#,
        )
        .bind(to_column(flight.id(), flight.remaining_seats())?)
        .bind(flight.id())
        .bind(expected.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(new_version) = new_version else {
            debug!(flight_id = %flight.id(), expected = expected.0, "Conditional update matched no row");
            tx.rollback().await.map_err(backend)?;
            return Ok(CommitOutcome::VersionConflict);
        };

        write_bookings(&mut tx, flight).await?;
        tx.commit().await.map_err(backend)?;

        Ok(CommitOutcome::Committed(Version(new_version)))
    }

    async fn insert(&self, flight: &Flight) -> Result<Version, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let result = sqlx::query(
            r#"
            INSERT INTO flights (
                id, airline, price_amount, price_currency,
                departure_place, departure_time, arrival_place, arrival_time,
                total_seats, remaining_seats, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(flight.id())
        .bind(flight.airline())
        .bind(flight.price_amount())
        .bind(flight.price_currency())
        .bind(&flight.departure().place)
        .bind(flight.departure().time)
        .bind(&flight.arrival().place)
        .bind(flight.arrival().time)
        .bind(to_column(flight.id(), flight.total_seats())?)
        .bind(to_column(flight.id(), flight.remaining_seats())?)
        .bind(Version::INITIAL.0)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(flight.id()));
        }

        write_bookings(&mut tx, flight).await?;
        tx.commit().await.map_err(backend)?;

        Ok(Version::INITIAL)
    }

    async fn list(&self) -> Result<Vec<VersionedFlight>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let rows = sqlx::query_as::<_, FlightRow>(&format!("{} ORDER BY departure_time", SELECT_FLIGHT))
            .fetch_all(&mut *tx)
            .await
            .map_err(backend)?;

        let booking_rows = sqlx::query_as::<_, BookingRow>(
            "SELECT flight_id, passenger_email, number_of_seats FROM bookings ORDER BY flight_id, position",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        let mut by_flight: HashMap<Uuid, Vec<BookingRow>> = HashMap::new();
        for booking in booking_rows {
            by_flight.entry(booking.flight_id).or_default().push(booking);
        }

        rows.into_iter()
            .map(|row| {
                let bookings = by_flight.remove(&row.id).unwrap_or_default();
                row.into_versioned(bookings)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(total: i32, remaining: i32) -> FlightRow {
        FlightRow {
            id: Uuid::new_v4(),
            airline: "Adria Airways".to_string(),
            price_amount: 200,
            price_currency: "EUR".to_string(),
            departure_place: "Ljubljana".to_string(),
            departure_time: Utc::now(),
            arrival_place: "Warsaw".to_string(),
            arrival_time: Utc::now(),
            total_seats: total,
            remaining_seats: remaining,
            version: 7,
        }
    }

    fn booking(flight_id: Uuid, email: &str, seats: i32) -> BookingRow {
        BookingRow {
            flight_id,
            passenger_email: email.to_string(),
            number_of_seats: seats,
        }
    }

    #[test]
    fn test_row_maps_to_versioned_flight() {
        let row = row(10, 7);
        let id = row.id;

        let versioned = row
            .into_versioned(vec![booking(id, "a@x.com", 2), booking(id, "b@x.com", 1)])
            .unwrap();

        assert_eq!(versioned.version, Version(7));
        assert_eq!(versioned.flight.remaining_seats(), 7);
        assert_eq!(versioned.flight.bookings()[0].passenger_email, "a@x.com");
    }

    #[test]
    fn test_unbalanced_row_is_corrupt() {
        let row = row(10, 9);
        let id = row.id;

        let result = row.into_versioned(vec![booking(id, "a@x.com", 2)]);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_negative_seats_are_corrupt() {
        let result = row(10, -1).into_versioned(vec![]);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
