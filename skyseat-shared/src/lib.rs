pub mod models;
pub mod pii;

pub use models::events::{BookingChangeKind, BookingChangedEvent};
pub use pii::Masked;
