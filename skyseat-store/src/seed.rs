use chrono::{Duration, Utc};
use rand::Rng;
use skyseat_core::{Flight, FlightStore, StoreError, TimePlace};
use tracing::info;

/// Airline, departure, arrival, latest departure hour, latest arrival hour
const ROUTES: &[(&str, &str, &str, i64, i64)] = &[
    ("American Airlines", "Los Angeles", "Istanbul", 3, 10),
    ("Deutsche BA", "Munchen", "Schiphol", 10, 15),
    ("British Airways", "London, England", "Vizzola-Ticino", 15, 18),
    ("Basiq Air", "Amsterdam", "Glasgow, Scotland", 21, 21),
    ("BB Heliag", "Zurich", "Baku", 23, 25),
    ("Adria Airways", "Ljubljana", "Warsaw", 15, 19),
    ("ABA Air", "Praha Ruzyne", "Paris", 55, 58),
    ("AB Corporate Aviation", "Le Bourget", "Zagreb", 58, 60),
];

/// Largest capacity handed to a demo flight
pub const MAX_DEMO_SEATS: u32 = 853;

/// Build `count` demo flights, cycling through the fixture routes
pub fn demo_flights<R: Rng>(rng: &mut R, count: usize) -> Vec<Flight> {
    let now = Utc::now();

    ROUTES
        .iter()
        .cycle()
        .take(count)
        .map(|&(airline, from, to, max_departure, max_arrival)| {
            let departs = now + Duration::hours(rng.gen_range(1..=max_departure));
            // Arrival is always after departure
            let arrives = departs + Duration::hours(rng.gen_range(1..=max_arrival.max(2)));

            Flight::new(
                airline,
                rng.gen_range(90..5000),
                "USD",
                TimePlace::new(from, departs),
                TimePlace::new(to, arrives),
                rng.gen_range(1..=MAX_DEMO_SEATS),
            )
        })
        .collect()
}

/// Insert demo flights, but only into an empty store
pub async fn seed_if_empty(store: &dyn FlightStore, count: usize) -> Result<usize, StoreError> {
    if !store.list().await?.is_empty() {
        info!("Store already holds flights, skipping seed");
        return Ok(0);
    }

    let flights = demo_flights(&mut rand::thread_rng(), count);
    for flight in &flights {
        store.insert(flight).await?;
    }

    info!("Seeded {} demo flights", flights.len());
    Ok(flights.len())
}
