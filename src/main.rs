//! rideCoordinator - Ride lifecycle backend API
//!
//! Coordinates the driver and passenger status of shared rides and streams
//! status notifications to both parties.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ride_coordinator::api::{self, AppState};
use ride_coordinator::config::StoreBackend;
use ride_coordinator::db;
use ride_coordinator::domain::ActorRole;
use ride_coordinator::gateway::{CircuitBreaker, ExistenceGateway, HttpActorDirectory};
use ride_coordinator::handlers::RideLifecycleService;
use ride_coordinator::notification::NotificationBus;
use ride_coordinator::pricing::RandomPriceGenerator;
use ride_coordinator::store::{InMemoryRideRepository, PgRideRepository, RideRepository, RideStore};
use ride_coordinator::Config;

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ride_coordinator=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Open the configured ride repository
async fn open_repository(
    config: &Config,
) -> anyhow::Result<(Arc<dyn RideRepository>, Option<PgPool>)> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;

            db::verify_connection(&pool).await?;
            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }

            tracing::info!("Database connected successfully");
            let repository: Arc<dyn RideRepository> = Arc::new(PgRideRepository::new(pool.clone()));
            Ok((repository, Some(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory ride storage; rides are lost on restart");
            let repository: Arc<dyn RideRepository> = Arc::new(InMemoryRideRepository::new());
            Ok((repository, None))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Starting rideCoordinator server");

    let (repository, pool) = open_repository(&config).await?;
    let store = Arc::new(RideStore::new(repository, config.cache_ttl));

    // Actor existence checks
    let client = reqwest::Client::builder()
        .timeout(config.gateway_timeout)
        .build()?;
    let drivers = ExistenceGateway::new(
        ActorRole::Driver,
        Arc::new(HttpActorDirectory::new(
            client.clone(),
            &config.driver_service_url,
            ActorRole::Driver,
        )),
        CircuitBreaker::new("driver-service", config.breaker_config()),
        config.gateway_timeout,
    );
    let passengers = ExistenceGateway::new(
        ActorRole::Passenger,
        Arc::new(HttpActorDirectory::new(
            client,
            &config.passenger_service_url,
            ActorRole::Passenger,
        )),
        CircuitBreaker::new("passenger-service", config.breaker_config()),
        config.gateway_timeout,
    );

    let (notifications, delivery) = NotificationBus::start(config.notification_buffer);

    let rides = Arc::new(RideLifecycleService::new(
        store,
        drivers,
        passengers,
        Arc::new(RandomPriceGenerator),
        Arc::new(notifications.clone()),
    ));

    let app = api::app(AppState::new(rides, notifications));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    delivery.abort();
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
