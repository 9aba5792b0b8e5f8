use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use wayfare_shared::{Booking, BookingStatus, TravelOption};

use crate::repository::{BookingStore, StoreError, StoreTransaction};
use crate::search::TravelSearch;

#[derive(Debug, Default)]
struct Tables {
    travel_options: HashMap<String, TravelOption>,
    bookings: HashMap<String, Booking>,
}

/// In-process store for development and tests.
///
/// A transaction owns the table lock for its whole lifetime, so
/// transactions are fully serialized. Writes are staged and applied on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            tables: guard,
            staged_options: HashMap::new(),
            staged_bookings: HashMap::new(),
        }))
    }

    async fn get_travel_option(
        &self,
        travel_id: &str,
    ) -> Result<Option<TravelOption>, StoreError> {
        Ok(self.tables.lock().await.travel_options.get(travel_id).cloned())
    }

    async fn get_booking(
        &self,
        booking_id: &str,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self.tables.lock().await.bookings.get(booking_id).cloned())
    }

    async fn list_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        Ok(bookings)
    }

    async fn search_travel_options(
        &self,
        search: &TravelSearch,
        today: NaiveDate,
    ) -> Result<Vec<TravelOption>, StoreError> {
        let tables = self.tables.lock().await;
        let mut options: Vec<TravelOption> = tables
            .travel_options
            .values()
            .filter(|o| search.matches(o, today))
            .cloned()
            .collect();
        options.sort_by(|a, b| {
            (a.departure_date, a.departure_time, &a.travel_id)
                .cmp(&(b.departure_date, b.departure_time, &b.travel_id))
        });
        Ok(options)
    }

    async fn insert_travel_option(
        &self,
        option: &TravelOption,
    ) -> Result<(), StoreError> {
        option.validate()?;

        let mut tables = self.tables.lock().await;
        if tables.travel_options.contains_key(&option.travel_id) {
            return Err(format!("Travel option {} already exists", option.travel_id).into());
        }
        tables.travel_options.insert(option.travel_id.clone(), option.clone());
        Ok(())
    }
}

struct MemoryTransaction {
    tables: OwnedMutexGuard<Tables>,
    staged_options: HashMap<String, TravelOption>,
    staged_bookings: HashMap<String, Booking>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_travel_option(
        &mut self,
        travel_id: &str,
    ) -> Result<Option<TravelOption>, StoreError> {
        let option = self
            .staged_options
            .get(travel_id)
            .or_else(|| self.tables.travel_options.get(travel_id))
            .cloned();
        Ok(option)
    }

    async fn lock_booking(
        &mut self,
        booking_id: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let booking = self
            .staged_bookings
            .get(booking_id)
            .or_else(|| self.tables.bookings.get(booking_id))
            .cloned();
        Ok(booking)
    }

    async fn save_travel_option(
        &mut self,
        option: &TravelOption,
    ) -> Result<(), StoreError> {
        option.validate()?;
        self.staged_options.insert(option.travel_id.clone(), option.clone());
        Ok(())
    }

    async fn insert_booking(
        &mut self,
        booking: &Booking,
    ) -> Result<bool, StoreError> {
        let known_option = self.staged_options.contains_key(&booking.travel_id)
            || self.tables.travel_options.contains_key(&booking.travel_id);
        if !known_option {
            return Err(format!("Booking {} references unknown travel option {}", booking.booking_id, booking.travel_id).into());
        }

        let taken = self.staged_bookings.contains_key(&booking.booking_id)
            || self.tables.bookings.contains_key(&booking.booking_id);
        if taken {
            return Ok(false);
        }

        self.staged_bookings.insert(booking.booking_id.clone(), booking.clone());
        Ok(true)
    }

    async fn update_booking_status(
        &mut self,
        booking: &Booking,
    ) -> Result<(), StoreError> {
        let from = booking
            .status
            .previous()
            .ok_or_else(|| format!("Booking {} cannot move to {}", booking.booking_id, booking.status))?;

        let mut current = self
            .staged_bookings
            .get(&booking.booking_id)
            .or_else(|| self.tables.bookings.get(&booking.booking_id))
            .cloned()
            .ok_or_else(|| format!("Booking {} does not exist", booking.booking_id))?;

        if current.status != from {
            return Err(format!(
                "Booking {} is {}, expected {}",
                booking.booking_id, current.status, from
            )
            .into());
        }

        current.status = booking.status;
        current.updated_at = booking.updated_at;
        self.staged_bookings.insert(current.booking_id.clone(), current);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut tables, staged_options, staged_bookings } = *self;
        tables.travel_options.extend(staged_options);
        tables.bookings.extend(staged_bookings);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
