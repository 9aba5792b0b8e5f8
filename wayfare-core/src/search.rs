use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use wayfare_shared::{TravelOption, TravelType};

/// Optional filters over bookable travel options.
///
/// Past departures and sold-out options are never listed. `source` and
/// `destination` are case-insensitive substring matches, price bounds are
/// inclusive.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TravelSearch {
    #[serde(rename = "type")]
    pub travel_type: Option<TravelType>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl TravelSearch {
    pub fn matches(&self, option: &TravelOption, today: NaiveDate) -> bool {
        if option.departure_date < today || option.available_seats == 0 {
            return false;
        }
        if let Some(travel_type) = self.travel_type {
            if option.travel_type != travel_type {
                return false;
            }
        }
        if !contains_ignore_case(&option.source, self.source.as_deref()) {
            return false;
        }
        if !contains_ignore_case(&option.destination, self.destination.as_deref()) {
            return false;
        }
        if let Some(date) = self.departure_date {
            if option.departure_date != date {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if option.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if option.price > max {
                return false;
            }
        }
        true
    }

    /// Blank text filters behave as if absent
    pub fn normalized(mut self) -> Self {
        self.source = self.source.filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string());
        self.destination = self.destination.filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string());
        self
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use rust_decimal_macros::dec;

    fn option(travel_type: TravelType, source: &str, day: NaiveDate, price: Decimal, seats: u32) -> TravelOption {
        TravelOption {
            travel_id: "X0001".to_string(),
            travel_type,
            source: source.to_string(),
            destination: "Chicago".to_string(),
            departure_date: day,
            departure_time: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            arrival_date: day,
            arrival_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            price,
            available_seats: seats,
            total_seats: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_hides_departed_and_sold_out() {
        let today = NaiveDate::from_ymd_opt(2030, 6, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let search = TravelSearch::default();

        assert!(search.matches(&option(TravelType::Train, "Boston", today, dec!(50), 1), today));
        assert!(!search.matches(&option(TravelType::Train, "Boston", yesterday, dec!(50), 1), today));
        assert!(!search.matches(&option(TravelType::Train, "Boston", today, dec!(50), 0), today));
    }

    #[test]
    fn test_filters_combine() {
        let today = NaiveDate::from_ymd_opt(2030, 6, 10).unwrap();
        let candidate = option(TravelType::Flight, "San Francisco", today, dec!(120.00), 10);

        let search = TravelSearch {
            travel_type: Some(TravelType::Flight),
            source: Some("francisco".to_string()),
            min_price: Some(dec!(120.00)),
            max_price: Some(dec!(200)),
            ..Default::default()
        };
        assert!(search.matches(&candidate, today));

        let wrong_type = TravelSearch { travel_type: Some(TravelType::Bus), ..search.clone() };
        assert!(!wrong_type.matches(&candidate, today));

        let too_cheap = TravelSearch { max_price: Some(dec!(119.99)), ..search };
        assert!(!too_cheap.matches(&candidate, today));
    }

    #[test]
    fn test_query_string_shape() {
        let search: TravelSearch = serde_json::from_str(
            r#"{"type": "bus", "destination": "  ", "departure_date": "2030-06-10", "max_price": "80.50"}"#,
        )
        .expect("Failed to deserialize");
        let search = search.normalized();

        assert_eq!(search.travel_type, Some(TravelType::Bus));
        assert_eq!(search.destination, None);
        assert_eq!(search.max_price, Some(dec!(80.50)));
    }
}
