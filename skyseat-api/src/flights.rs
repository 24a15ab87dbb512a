use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::stream::{Stream, StreamExt};
use skyseat_core::{BookingReceipt, FlightSearchParameters};
use skyseat_shared::{BookingChangeKind, BookingChangedEvent};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{BookDto, FlightRm};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flight", get(search_flights).post(book_flight))
        .route("/flight/{id}", get(find_flight))
        .route("/flight/{id}/stream", get(flight_stream))
}

async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<FlightSearchParameters>,
) -> Result<Json<Vec<FlightRm>>, AppError> {
    let flights = state.bookings.search(&params).await?;
    Ok(Json(flights.iter().map(FlightRm::from).collect()))
}

async fn find_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightRm>, AppError> {
    let flight = state.bookings.get_flight(id).await?;
    Ok(Json(FlightRm::from(&flight)))
}

async fn book_flight(
    State(state): State<AppState>,
    Json(dto): Json<BookDto>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    dto.validate()?;
    info!("Booking at flight {}", dto.flight_id);

    let receipt = state
        .bookings
        .make_booking(dto.flight_id, dto.email(), u32::from(dto.number_of_seats))
        .await?;

    state.publish(BookingChangedEvent::now(
        receipt.flight_id,
        BookingChangeKind::Booked,
        u32::from(dto.number_of_seats),
        receipt.remaining_seats,
        receipt.version.0,
    ));

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Live seat counts for one flight
async fn flight_stream(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // 404 for flights that do not exist rather than an idle stream
    state.bookings.get_flight(flight_id).await?;

    let stream = BroadcastStream::new(state.events_tx.subscribe()).filter_map(move |result| async move {
        match result {
            Ok(event) if event.flight_id == flight_id => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok::<_, Infallible>(Event::default().event("seats_changed").data(data)))
            }
            // Lagged receivers just skip ahead
            _ => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
