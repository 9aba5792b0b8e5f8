pub mod clock;
pub mod events;
pub mod inventory;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod search;

pub use clock::{Clock, FixedClock, SystemClock};
pub use events::{EventPublisher, NoopPublisher};
pub use inventory::{CapacityError, InventoryGuard};
pub use lifecycle::{BookingService, CreateBooking, MAX_SEATS_PER_BOOKING};
pub use memory::MemoryBookingStore;
pub use repository::{BookingStore, StoreError, StoreTransaction};
pub use search::TravelSearch;

/// Malformed booking input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Number of seats must be between 1 and {max}, got {requested}")]
    SeatCountOutOfRange { requested: i64, max: u32 },

    #[error("Please provide exactly {expected} passenger names, got {actual}")]
    PassengerCountMismatch { expected: u32, actual: usize },

    #[error("Contact phone is required")]
    MissingContactPhone,

    #[error("Contact phone must be at most {max} characters")]
    ContactPhoneTooLong { max: usize },
}

/// The option cannot take the booking right now
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableError {
    #[error("Travel option {travel_id} has already departed")]
    Departed { travel_id: String },

    #[error("Only {available} seats available, requested {requested}")]
    InsufficientSeats { requested: u32, available: u32 },
}

impl From<CapacityError> for UnavailableError {
    fn from(err: CapacityError) -> Self {
        UnavailableError::InsufficientSeats {
            requested: err.requested,
            available: err.available,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Travel option unavailable: {0}")]
    Unavailable(#[from] UnavailableError),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("Booking {0} can no longer be cancelled")]
    NotCancellable(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Store transaction failed: {0}")]
    Transaction(#[source] StoreError),
}

impl BookingError {
    pub fn travel_option_not_found(id: &str) -> Self {
        BookingError::NotFound { entity: "Travel option", id: id.to_string() }
    }

    pub fn booking_not_found(id: &str) -> Self {
        BookingError::NotFound { entity: "Booking", id: id.to_string() }
    }

    /// Store failures are the only kind a caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Transaction(_))
    }
}

impl From<CapacityError> for BookingError {
    fn from(err: CapacityError) -> Self {
        BookingError::Unavailable(err.into())
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        BookingError::Transaction(err)
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
