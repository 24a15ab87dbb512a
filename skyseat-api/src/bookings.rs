use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use skyseat_shared::{BookingChangeKind, BookingChangedEvent};
use tracing::info;

use crate::error::AppError;
use crate::models::{BookDto, BookingRm};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking/{email}", get(list_bookings))
        .route("/booking", delete(cancel_booking))
}

async fn list_bookings(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<BookingRm>>, AppError> {
    let bookings = state.bookings.bookings_for(&email).await?;
    Ok(Json(bookings.iter().map(|b| BookingRm::new(b, &email)).collect()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Json(dto): Json<BookDto>,
) -> Result<StatusCode, AppError> {
    dto.validate()?;

    let receipt = state
        .bookings
        .cancel_booking(dto.flight_id, dto.email(), u32::from(dto.number_of_seats))
        .await?;
    info!("Cancelled {} seats on flight {}", dto.number_of_seats, dto.flight_id);

    state.publish(BookingChangedEvent::now(
        receipt.flight_id,
        BookingChangeKind::Cancelled,
        u32::from(dto.number_of_seats),
        receipt.remaining_seats,
        receipt.version.0,
    ));

    Ok(StatusCode::NO_CONTENT)
}
