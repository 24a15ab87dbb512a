use anyhow::Context;
use skyseat_api::{app, AppState};
use skyseat_core::{BookingService, FlightStore};
use skyseat_store::app_config::{Config, StorageBackend};
use skyseat_store::{seed, DbClient, InMemoryFlightStore, PgFlightStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyseat_api=debug,skyseat_core=debug,skyseat_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Skyseat API on port {}", config.server.port);

    let store: Arc<dyn FlightStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory flight store");
            Arc::new(InMemoryFlightStore::new())
        }
        StorageBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("storage.backend = postgres needs a [database] section")?;
            let db = DbClient::new(&database.url, database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgFlightStore::new(db.pool.clone()))
        }
    };

    if config.seed.enabled {
        seed::seed_if_empty(store.as_ref(), config.seed.flights)
            .await
            .context("Failed to seed demo flights")?;
    }

    let policy = config.booking.retry_policy();
    tracing::info!("Commits retry up to {} times on conflict", policy.max_attempts());
    let service = Arc::new(BookingService::new(store, policy));

    let app = app(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
