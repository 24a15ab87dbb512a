use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::flight::Flight;

/// Optional filters for listing flights. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightSearchParameters {
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub from: Option<String>,
    pub destination: Option<String>,
    pub number_of_passengers: Option<u32>,
}

impl FlightSearchParameters {
    pub fn matches(&self, flight: &Flight) -> bool {
        let departs = flight.departure().time;

        if self.from_date.is_some_and(|from| departs < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| departs > to) {
            return false;
        }
        if let Some(from) = &self.from {
            if !contains_ignore_case(&flight.departure().place, from) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !contains_ignore_case(&flight.arrival().place, destination) {
                return false;
            }
        }

        self.number_of_passengers
            .map_or(true, |n| flight.remaining_seats() >= n)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::TimePlace;
    use chrono::{Duration, TimeZone};

    fn flight() -> Flight {
        let departs = Utc.with_ymd_and_hms(2023, 12, 25, 12, 0, 0).unwrap();
        Flight::new(
            "Deutsche BA",
            450,
            "EUR",
            TimePlace::new("Munchen", departs),
            TimePlace::new("Schiphol", departs + Duration::hours(2)),
            4,
        )
    }

    #[test]
    fn test_empty_parameters_match_everything() {
        assert!(FlightSearchParameters::default().matches(&flight()));
    }

    #[test]
    fn test_place_filters_are_case_insensitive() {
        let params = FlightSearchParameters {
            from: Some("munch".to_string()),
            destination: Some("SCHIPHOL".to_string()),
            ..Default::default()
        };
        assert!(params.matches(&flight()));

        let params = FlightSearchParameters {
            destination: Some("Berlin".to_string()),
            ..Default::default()
        };
        assert!(!params.matches(&flight()));
    }

    #[test]
    fn test_date_window() {
        let day = Utc.with_ymd_and_hms(2023, 12, 25, 0, 0, 0).unwrap();
        let inside = FlightSearchParameters {
            from_date: Some(day),
            to_date: Some(day + Duration::days(1)),
            ..Default::default()
        };
        assert!(inside.matches(&flight()));

        let after = FlightSearchParameters {
            from_date: Some(day + Duration::days(1)),
            ..Default::default()
        };
        assert!(!after.matches(&flight()));
    }

    #[test]
    fn test_passenger_count_needs_enough_seats() {
        let mut flight = flight();
        flight.make_booking("a@x.com", 2).unwrap();

        let two = FlightSearchParameters { number_of_passengers: Some(2), ..Default::default() };
        let three = FlightSearchParameters { number_of_passengers: Some(3), ..Default::default() };

        assert!(two.matches(&flight));
        assert!(!three.matches(&flight));
    }
}
