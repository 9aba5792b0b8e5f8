use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::booking::Booking;

pub const BOOKING_CONFIRMED_TOPIC: &str = "booking.confirmed";
pub const BOOKING_CANCELLED_TOPIC: &str = "booking.cancelled";

/// Emitted after a booking transaction commits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    Confirmed {
        booking_id: String,
        user_id: String,
        travel_id: String,
        number_of_seats: u32,
        total_price: Decimal,
        timestamp: i64,
    },
    Cancelled {
        booking_id: String,
        user_id: String,
        travel_id: String,
        released_seats: u32,
        timestamp: i64,
    },
}

impl BookingEvent {
    pub fn confirmed(booking: &Booking) -> Self {
        BookingEvent::Confirmed {
            booking_id: booking.booking_id.clone(),
            user_id: booking.user_id.clone(),
            travel_id: booking.travel_id.clone(),
            number_of_seats: booking.number_of_seats,
            total_price: booking.total_price,
            timestamp: booking.created_at.timestamp(),
        }
    }

    pub fn cancelled(booking: &Booking, released_seats: u32) -> Self {
        BookingEvent::Cancelled {
            booking_id: booking.booking_id.clone(),
            user_id: booking.user_id.clone(),
            travel_id: booking.travel_id.clone(),
            released_seats,
            timestamp: booking.updated_at.timestamp(),
        }
    }

    pub fn topic(&self) -> &'static str {
        match self {
            BookingEvent::Confirmed { .. } => BOOKING_CONFIRMED_TOPIC,
            BookingEvent::Cancelled { .. } => BOOKING_CANCELLED_TOPIC,
        }
    }

    /// Partition key; events for one travel option stay ordered
    pub fn key(&self) -> &str {
        match self {
            BookingEvent::Confirmed { travel_id, .. } | BookingEvent::Cancelled { travel_id, .. } => travel_id,
        }
    }
}
