//! Live auction server: websocket live feed backed by PostgreSQL and Redis.

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use live_auction::adapters::{
    live_feed_router, LiveFeedState, PostgresAuctionStore, RedisBroadcaster, RedisPresenceStore,
    RedisRelay, RedisTimerBus, RoomManager,
};
use live_auction::application::AuctionEngine;
use live_auction::config::{AppConfig, ConfigError, ServerConfig};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis unavailable: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis connection timed out")]
    RedisTimeout,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate().map_err(ConfigError::from)?;
    init_tracing(&config.server);

    // Record store
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    // Broadcast, presence and timer signals
    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = tokio::time::timeout(
        config.redis.timeout(),
        redis_client.get_multiplexed_async_connection(),
    )
    .await
    .map_err(|_| StartupError::RedisTimeout)??;
    let prefix = config.redis.channel_prefix.clone();

    let rooms = Arc::new(RoomManager::new(config.engine.room_capacity));
    let engine = Arc::new(AuctionEngine::clustered(
        Arc::new(PostgresAuctionStore::new(pool)),
        Arc::new(RedisBroadcaster::new(redis_conn.clone(), prefix.clone())),
        Arc::new(RedisPresenceStore::new(redis_conn.clone(), prefix.clone())),
        Arc::new(RedisTimerBus::new(redis_conn, prefix.clone())),
        &config.engine,
    ));

    // Background tasks
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = engine.presence_sweeper();
    let sweeper_shutdown = shutdown_rx.clone();
    let sweeper_task = tokio::spawn(async move { sweeper.run(sweeper_shutdown).await });

    let relay = RedisRelay::new(redis_client, prefix, rooms.clone()).with_timers(engine.timers());
    let relay_shutdown = shutdown_rx.clone();
    let relay_task = tokio::spawn(async move { relay.run(relay_shutdown).await });

    let mut expiries = engine.subscribe_expiries();
    tokio::spawn(async move {
        while let Ok(expiry) = expiries.recv().await {
            tracing::info!(
                auction_id = %expiry.auction_id,
                player_id = %expiry.player_id,
                "Countdown expired; awaiting admin decision"
            );
        }
    });

    // HTTP
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(live_feed_router().with_state(LiveFeedState::new(engine, rooms)))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Live auction server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Shutting down background tasks");
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(sweeper_task, relay_task);
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<http::HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
}
