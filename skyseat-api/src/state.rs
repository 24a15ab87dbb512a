use std::sync::Arc;
use skyseat_core::BookingService;
use skyseat_shared::BookingChangedEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub events_tx: broadcast::Sender<BookingChangedEvent>,
}

impl AppState {
    pub fn new(bookings: Arc<BookingService>) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        Self { bookings, events_tx }
    }

    /// Fan out a committed change; nobody listening is fine
    pub fn publish(&self, event: BookingChangedEvent) {
        let _ = self.events_tx.send(event);
    }
}
