use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pii::Masked;
use crate::ParseEnumError;

/// Booking status; `Confirmed -> Cancelled` is the only transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// The only status a booking may move here from; `None` for the initial one
    pub fn previous(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Confirmed => None,
            BookingStatus::Cancelled => Some(BookingStatus::Confirmed),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ParseEnumError {
                kind: "booking status",
                value: other.to_string(),
            }),
        }
    }
}

/// Passenger payload owned by a single booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerDetails {
    pub names: Vec<String>,
    pub contact_phone: Masked<String>,
}

/// A user's reservation of N seats on one travel option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub booking_id: String,
    pub user_id: String,
    pub travel_id: String,
    pub number_of_seats: u32,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub passenger_details: PassengerDetails,
    pub booking_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// `BK` followed by eight upper-case hex characters
    pub fn generate_id() -> String {
        let raw = Uuid::new_v4().simple().to_string();
        format!("BK{}", raw[..8].to_uppercase())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Cancellation window closes on the departure day
    pub fn can_be_cancelled(&self, departure_date: NaiveDate, today: NaiveDate) -> bool {
        self.status == BookingStatus::Confirmed && departure_date > today
    }

    pub fn mark_cancelled(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Booking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Booking {} - {}", self.booking_id, self.user_id)
    }
}
