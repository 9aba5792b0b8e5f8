use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Kind of journey leg
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelType {
    Flight,
    Train,
    Bus,
}

impl TravelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelType::Flight => "flight",
            TravelType::Train => "train",
            TravelType::Bus => "bus",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            TravelType::Flight => "Flight",
            TravelType::Train => "Train",
            TravelType::Bus => "Bus",
        }
    }
}

impl FromStr for TravelType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flight" => Ok(TravelType::Flight),
            "train" => Ok(TravelType::Train),
            "bus" => Ok(TravelType::Bus),
            other => Err(ParseEnumError {
                kind: "travel type",
                value: other.to_string(),
            }),
        }
    }
}

/// A single bookable journey leg with fixed capacity and price.
///
/// `available_seats` is only ever mutated inside a store transaction by the
/// booking lifecycle; `0 <= available_seats <= total_seats` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TravelOption {
    pub travel_id: String,
    #[serde(rename = "type")]
    pub travel_type: TravelType,
    pub source: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub price: Decimal,
    pub available_seats: u32,
    pub total_seats: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelOption {
    pub fn is_available(&self, requested_seats: u32) -> bool {
        self.available_seats >= requested_seats
    }

    pub fn is_fully_booked(&self) -> bool {
        self.available_seats == 0
    }

    /// Departure day is strictly before `today`
    pub fn has_departed(&self, today: NaiveDate) -> bool {
        self.departure_date < today
    }

    /// Checks the column constraints a store enforces on insert
    pub fn validate(&self) -> Result<(), String> {
        if self.travel_id.trim().is_empty() {
            return Err("travel_id must not be empty".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err(format!("price must be positive, got {}", self.price));
        }
        if self.total_seats < 1 {
            return Err("total_seats must be at least 1".to_string());
        }
        if self.available_seats > self.total_seats {
            return Err(format!(
                "available_seats {} exceeds total_seats {}",
                self.available_seats, self.total_seats
            ));
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for TravelOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} from {} to {}",
            self.travel_id,
            self.travel_type.label(),
            self.source,
            self.destination
        )
    }
}
