//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::gateway::BreakerConfig;

/// Where rides are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidValue("RIDE_STORE")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL; required for the Postgres backend
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub store_backend: StoreBackend,

    /// Lifetime of a cached ride
    pub cache_ttl: Duration,

    /// Base URL of the driver directory service
    pub driver_service_url: String,

    /// Base URL of the passenger directory service
    pub passenger_service_url: String,

    /// Per-call timeout for existence checks
    pub gateway_timeout: Duration,

    pub breaker_failure_threshold: u32,
    pub breaker_open_duration: Duration,
    pub breaker_success_threshold: u32,

    /// Capacity of the notification queue and each role channel
    pub notification_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend: StoreBackend = env_or("RIDE_STORE", "postgres").parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", "10")?;
        let host = env_or("HOST", "127.0.0.1");
        let port = parse_env("PORT", "3000")?;
        let environment = env_or("ENVIRONMENT", "development");

        let cache_ttl = Duration::from_secs(parse_env("RIDE_CACHE_TTL_SECS", "30")?);

        let driver_service_url = env_or("DRIVER_SERVICE_URL", "http://127.0.0.1:8081");
        let passenger_service_url = env_or("PASSENGER_SERVICE_URL", "http://127.0.0.1:8082");
        let gateway_timeout = Duration::from_millis(parse_env("GATEWAY_TIMEOUT_MS", "2000")?);

        let breaker_failure_threshold = parse_env("BREAKER_FAILURE_THRESHOLD", "5")?;
        let breaker_open_duration = Duration::from_secs(parse_env("BREAKER_OPEN_SECS", "30")?);
        let breaker_success_threshold = parse_env("BREAKER_SUCCESS_THRESHOLD", "2")?;

        let notification_buffer = parse_env("NOTIFICATION_BUFFER", "1024")?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            store_backend,
            cache_ttl,
            driver_service_url,
            passenger_service_url,
            gateway_timeout,
            breaker_failure_threshold,
            breaker_open_duration,
            breaker_success_threshold,
            notification_buffer,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.breaker_failure_threshold.max(1),
            open_duration: self.breaker_open_duration,
            success_threshold: self.breaker_success_threshold.max(1),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    env_or(key, default)
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_env_default_and_invalid() {
        let value: u32 = parse_env("RIDE_COORDINATOR_TEST_UNSET_VAR", "17").unwrap();
        assert_eq!(value, 17);

        let err = parse_env::<u16>("RIDE_COORDINATOR_TEST_UNSET_VAR", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_breaker_config_floors_thresholds() {
        let config = Config {
            database_url: None,
            database_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "production".to_string(),
            store_backend: StoreBackend::Memory,
            cache_ttl: Duration::from_secs(1),
            driver_service_url: String::new(),
            passenger_service_url: String::new(),
            gateway_timeout: Duration::from_millis(10),
            breaker_failure_threshold: 0,
            breaker_open_duration: Duration::from_secs(5),
            breaker_success_threshold: 0,
            notification_buffer: 8,
        };

        let breaker = config.breaker_config();
        assert_eq!(breaker.failure_threshold, 1);
        assert_eq!(breaker.success_threshold, 1);
        assert!(config.is_production());
    }
}
