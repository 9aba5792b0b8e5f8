use std::sync::Arc;
use std::net::SocketAddr;
use wayfare_api::{app, state::{AppState, AuthConfig}};
use wayfare_core::{BookingService, BookingStore, EventPublisher, MemoryBookingStore, NoopPublisher};
use wayfare_store::{app_config::Config, DbClient, EventProducer, PgBookingStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,wayfare_core=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    // Persistence
    let store: Arc<dyn BookingStore> = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections).await?;
            db.migrate().await?;
            Arc::new(PgBookingStore::new(db.pool.clone()))
        }
        None => {
            tracing::warn!("No database url configured, bookings are kept in memory");
            Arc::new(MemoryBookingStore::new())
        }
    };

    // Kafka Connection
    let events: Arc<dyn EventPublisher> = match &config.kafka.brokers {
        Some(brokers) => Arc::new(EventProducer::new(brokers)?),
        None => Arc::new(NoopPublisher),
    };

    // Redis Connection
    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(RedisClient::new(url).await?)),
        None => None,
    };

    let app_state = AppState {
        bookings: Arc::new(BookingService::new(store).with_events(events)),
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rate_limit: config.rate_limit.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}
