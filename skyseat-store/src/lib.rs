pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod memory;
pub mod seed;

pub use database::DbClient;
pub use flight_repo::PgFlightStore;
pub use memory::InMemoryFlightStore;
