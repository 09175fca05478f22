//! Application configuration module
//!
//! Configuration is read from environment variables with the `LIVE_AUCTION`
//! prefix, using `__` between nested keys. A `.env` file is honoured in
//! development.
//!
//! # Example
//!
//! ```no_run
//! use live_auction::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod engine;
mod error;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Auction record store
    pub database: DatabaseConfig,

    /// Broadcast fan-out and presence sessions
    pub redis: RedisConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// - `LIVE_AUCTION__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LIVE_AUCTION__ENGINE__TICK_INTERVAL_MS=500` -> `engine.tick_interval_ms = 500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LIVE_AUCTION")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.engine.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
