use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use wayfare_shared::pii::Masked;
use wayfare_shared::{Booking, BookingEvent, BookingStatus, PassengerDetails, TravelOption};

use crate::clock::{Clock, SystemClock};
use crate::events::{EventPublisher, NoopPublisher};
use crate::inventory::InventoryGuard;
use crate::repository::{BookingStore, StoreTransaction};
use crate::search::TravelSearch;
use crate::{BookingError, BookingResult, UnavailableError, ValidationError};

pub const MAX_SEATS_PER_BOOKING: u32 = 10;
pub const MAX_CONTACT_PHONE_LEN: usize = 15;
/// Fresh ids tried before a create gives up on id collisions
pub const MAX_BOOKING_ID_ATTEMPTS: u32 = 5;

/// Input for a new booking on behalf of `user_id`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub user_id: String,
    pub travel_id: String,
    /// Signed so out-of-range input still reaches validation
    pub number_of_seats: i64,
    pub passenger_names: Vec<String>,
    pub contact_phone: Masked<String>,
}

impl CreateBooking {
    /// Trimmed names with blank entries dropped
    fn passenger_names(&self) -> Vec<String> {
        self.passenger_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Seat count and normalized passenger names
    fn validate(&self) -> Result<(u32, Vec<String>), ValidationError> {
        let seats = u32::try_from(self.number_of_seats)
            .ok()
            .filter(|n| (1..=MAX_SEATS_PER_BOOKING).contains(n))
            .ok_or(ValidationError::SeatCountOutOfRange {
                requested: self.number_of_seats,
                max: MAX_SEATS_PER_BOOKING,
            })?;

        let names = self.passenger_names();
        if names.len() != seats as usize {
            return Err(ValidationError::PassengerCountMismatch {
                expected: seats,
                actual: names.len(),
            });
        }

        let phone = self.contact_phone.expose().trim();
        if phone.is_empty() {
            return Err(ValidationError::MissingContactPhone);
        }
        if phone.chars().count() > MAX_CONTACT_PHONE_LEN {
            return Err(ValidationError::ContactPhoneTooLong { max: MAX_CONTACT_PHONE_LEN });
        }

        Ok((seats, names))
    }
}

/// Creates, prices and cancels bookings. Every seat-count change happens in
/// the same store transaction as the booking write it belongs to.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    guard: InventoryGuard,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            store,
            events: Arc::new(NoopPublisher),
            clock: Arc::new(SystemClock),
            guard: InventoryGuard::new(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    /// Reserve seats and persist a confirmed booking
    pub async fn create_booking(&self, req: CreateBooking) -> BookingResult<Booking> {
        let (seats, names) = req.validate()?;

        let mut tx = self.store.begin().await?;
        let outcome = self.create_in_tx(tx.as_mut(), &req, seats, names).await;
        let booking = finish(tx, outcome).await?;

        info!(
            "Booking {} confirmed: {} seats on {} for {}",
            booking.booking_id, booking.number_of_seats, booking.travel_id, booking.user_id
        );
        self.publish(BookingEvent::confirmed(&booking)).await;

        Ok(booking)
    }

    async fn create_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        req: &CreateBooking,
        seats: u32,
        names: Vec<String>,
    ) -> BookingResult<Booking> {
        let mut option = tx
            .lock_travel_option(&req.travel_id)
            .await?
            .ok_or_else(|| BookingError::travel_option_not_found(&req.travel_id))?;

        if option.has_departed(self.clock.today()) {
            return Err(UnavailableError::Departed { travel_id: option.travel_id.clone() }.into());
        }

        self.guard.reserve(&mut option, seats)?;

        let now = Utc::now();
        let mut booking = Booking {
            booking_id: Booking::generate_id(),
            user_id: req.user_id.clone(),
            travel_id: option.travel_id.clone(),
            number_of_seats: seats,
            total_price: total_price(&option, seats),
            status: BookingStatus::Confirmed,
            passenger_details: PassengerDetails {
                names,
                contact_phone: Masked(req.contact_phone.expose().trim().to_string()),
            },
            booking_date: now,
            created_at: now,
            updated_at: now,
        };

        tx.save_travel_option(&option).await?;

        for attempt in 1..=MAX_BOOKING_ID_ATTEMPTS {
            if tx.insert_booking(&booking).await? {
                return Ok(booking);
            }
            warn!(
                "Booking id {} already taken (attempt {}/{})",
                booking.booking_id, attempt, MAX_BOOKING_ID_ATTEMPTS
            );
            booking.booking_id = Booking::generate_id();
        }

        Err(BookingError::Transaction(
            format!("No free booking id after {} attempts", MAX_BOOKING_ID_ATTEMPTS).into(),
        ))
    }

    /// Cancel a confirmed booking owned by `requesting_user_id` and return its
    /// seats to inventory. A second call fails with `AlreadyCancelled`.
    pub async fn cancel_booking(&self, booking_id: &str, requesting_user_id: &str) -> BookingResult<bool> {
        let mut tx = self.store.begin().await?;
        let outcome = self.cancel_in_tx(tx.as_mut(), booking_id, requesting_user_id).await;
        let (booking, released) = finish(tx, outcome).await?;

        info!(
            "Booking {} cancelled: {} seats returned to {}",
            booking.booking_id, released, booking.travel_id
        );
        self.publish(BookingEvent::cancelled(&booking, released)).await;

        Ok(true)
    }

    async fn cancel_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        booking_id: &str,
        requesting_user_id: &str,
    ) -> BookingResult<(Booking, u32)> {
        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .filter(|b| b.user_id == requesting_user_id)
            .ok_or_else(|| BookingError::booking_not_found(booking_id))?;

        if booking.is_cancelled() {
            return Err(BookingError::AlreadyCancelled(booking.booking_id));
        }

        let mut option = tx
            .lock_travel_option(&booking.travel_id)
            .await?
            .ok_or_else(|| BookingError::travel_option_not_found(&booking.travel_id))?;

        if !booking.can_be_cancelled(option.departure_date, self.clock.today()) {
            return Err(BookingError::NotCancellable(booking.booking_id));
        }

        booking.mark_cancelled();
        let released = self.guard.release(&mut option, booking.number_of_seats);

        tx.save_travel_option(&option).await?;
        tx.update_booking_status(&booking).await?;

        Ok((booking, released))
    }

    /// Owner-only lookup; other users' bookings read as missing
    pub async fn get_booking(&self, booking_id: &str, requesting_user_id: &str) -> BookingResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .filter(|b| b.user_id == requesting_user_id)
            .ok_or_else(|| BookingError::booking_not_found(booking_id))
    }

    pub async fn list_bookings(&self, user_id: &str, status: Option<BookingStatus>) -> BookingResult<Vec<Booking>> {
        Ok(self.store.list_bookings(user_id, status).await?)
    }

    pub async fn get_travel_option(&self, travel_id: &str) -> BookingResult<TravelOption> {
        self.store
            .get_travel_option(travel_id)
            .await?
            .ok_or_else(|| BookingError::travel_option_not_found(travel_id))
    }

    pub async fn search_travel_options(&self, search: &TravelSearch) -> BookingResult<Vec<TravelOption>> {
        Ok(self.store.search_travel_options(search, self.clock.today()).await?)
    }

    async fn publish(&self, event: BookingEvent) {
        if let Err(e) = self.events.publish(&event).await {
            error!("Failed to publish {} for {}: {}", event.topic(), event.key(), e);
        }
    }
}

fn total_price(option: &TravelOption, seats: u32) -> Decimal {
    option.price * Decimal::from(seats)
}

/// Commit on success, roll back on any failure
async fn finish<T>(tx: Box<dyn StoreTransaction>, outcome: BookingResult<T>) -> BookingResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                warn!("Rollback failed after {}: {}", e, rb);
            }
            Err(e)
        }
    }
}
