use async_trait::async_trait;
use chrono::NaiveDate;
use wayfare_shared::{Booking, BookingStatus, TravelOption};

use crate::search::TravelSearch;

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Persistence boundary for travel options and bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open an atomic unit of work
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    async fn get_travel_option(
        &self,
        travel_id: &str,
    ) -> Result<Option<TravelOption>, StoreError>;

    async fn get_booking(
        &self,
        booking_id: &str,
    ) -> Result<Option<Booking>, StoreError>;

    /// Newest booking first
    async fn list_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Bookable options matching the filter, ordered by departure
    async fn search_travel_options(
        &self,
        search: &TravelSearch,
        today: NaiveDate,
    ) -> Result<Vec<TravelOption>, StoreError>;

    async fn insert_travel_option(
        &self,
        option: &TravelOption,
    ) -> Result<(), StoreError>;
}

/// Work done through a transaction is invisible to other callers until
/// `commit`; dropping it without committing discards everything.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Reads the option and holds it exclusively until commit or rollback
    async fn lock_travel_option(
        &mut self,
        travel_id: &str,
    ) -> Result<Option<TravelOption>, StoreError>;

    async fn lock_booking(
        &mut self,
        booking_id: &str,
    ) -> Result<Option<Booking>, StoreError>;

    async fn save_travel_option(
        &mut self,
        option: &TravelOption,
    ) -> Result<(), StoreError>;

    /// Adds a new booking. `Ok(false)` means the id is already taken and
    /// nothing was written.
    async fn insert_booking(
        &mut self,
        booking: &Booking,
    ) -> Result<bool, StoreError>;

    /// Moves a stored booking to `booking.status`. Only the status and
    /// `updated_at` change. Fails unless the stored status is the one
    /// `BookingStatus::previous` allows.
    async fn update_booking_status(
        &mut self,
        booking: &Booking,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
