pub mod models;
pub mod pii;

pub use models::booking::{Booking, BookingStatus, PassengerDetails};
pub use models::events::BookingEvent;
pub use models::travel::{TravelOption, TravelType};

/// Raised when a stored enum value does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
