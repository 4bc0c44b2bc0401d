//! Application configuration loaded from environment variables.

use std::time::Duration;

use relay::RelayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; the store falls back to
///   in-memory when unset
/// - `RELAY_POLL_INTERVAL_MS` — outbox polling period (default: `500`)
/// - `RELAY_BATCH_SIZE` — records fetched per pass (default: `32`)
/// - `RELAY_MAX_ATTEMPTS` — delivery retries before terminal failure
///   (default: `5`)
/// - `RELAY_DELIVERY_TIMEOUT_MS` — per-publish timeout (default: `3000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub relay: RelayConfig,
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = RelayConfig::default();
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PORT").unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            relay: RelayConfig {
                poll_interval: env_parsed("RELAY_POLL_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll_interval),
                batch_size: env_parsed("RELAY_BATCH_SIZE").unwrap_or(defaults.batch_size),
                max_attempts: env_parsed("RELAY_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
                delivery_timeout: env_parsed("RELAY_DELIVERY_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.delivery_timeout),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            relay: RelayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
