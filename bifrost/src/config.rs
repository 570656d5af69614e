//! Environment-driven configuration.

use std::env;
use std::time::Duration;

use crate::cli::Cli;

/// Default listening port.
const DEFAULT_PORT: u16 = 3000;
/// Default bind address.
const DEFAULT_HOST: &str = "0.0.0.0";
/// Default SWR cache TTL: 24 hours.
const DEFAULT_CACHE_TTL_MS: u64 = 86_400_000;
/// Default log filter.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration assembled from the environment and CLI flags.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address (`HOST`).
    pub host: String,
    /// Listening port (`PORT`).
    pub port: u16,
    /// SWR cache TTL (`CACHE_TTL_MS`).
    pub cache_ttl: Duration,
    /// Log filter directive (`LOG_LEVEL`).
    pub log_level: String,
    /// Emit logs as JSON (`--json-logs`).
    pub json_logs: bool,
    /// Log every GraphQL request (`--debug-requests`).
    pub debug_requests: bool,
    /// Erowid datasource settings; present when `PLEBISCITE` is set.
    pub plebiscite: Option<PlebisciteConfig>,
}

/// Settings for the optional erowid document store.
#[derive(Debug, Clone)]
pub struct PlebisciteConfig {
    /// Connection string (`MONGO_URL`).
    pub mongo_url: String,
    /// Database name (`MONGO_DB`).
    pub database: String,
    /// Collection name (`MONGO_COLLECTION`).
    pub collection: String,
}

/// Configuration failures that abort the bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable did not parse.
    #[error("invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },

    /// `PLEBISCITE` was set without its required connection string.
    #[error("PLEBISCITE is set but MONGO_URL is missing")]
    MissingMongoUrl,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_var("PORT", DEFAULT_PORT)?;
        let cache_ttl_ms: u64 = parse_var("CACHE_TTL_MS", DEFAULT_CACHE_TTL_MS)?;

        let plebiscite = match env::var("PLEBISCITE") {
            Ok(_) => {
                let mongo_url = env::var("MONGO_URL").map_err(|_| ConfigError::MissingMongoUrl)?;
                Some(PlebisciteConfig {
                    mongo_url,
                    database: env::var("MONGO_DB").unwrap_or_else(|_| "bifrost".to_owned()),
                    collection: env::var("MONGO_COLLECTION")
                        .unwrap_or_else(|_| "plebiscite".to_owned()),
                })
            }
            Err(_) => None,
        };

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_owned()),
            port,
            cache_ttl: Duration::from_millis(cache_ttl_ms),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned()),
            json_logs: false,
            debug_requests: false,
            plebiscite,
        })
    }

    /// Applies CLI flag overrides on top of the environment values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }
        if cli.json_logs {
            self.json_logs = true;
        }
        if cli.debug_requests {
            self.debug_requests = true;
        }
    }

    /// The `host:port` pair to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutation is process-global; keep it to a single test.
    #[test]
    fn env_round_trip() {
        unsafe {
            env::set_var("PORT", "4000");
            env::set_var("CACHE_TTL_MS", "1800000");
            env::set_var("LOG_LEVEL", "debug");
            env::remove_var("PLEBISCITE");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.cache_ttl, Duration::from_millis(1_800_000));
        assert_eq!(config.log_level, "debug");
        assert!(config.plebiscite.is_none());
        assert_eq!(config.bind_addr(), "0.0.0.0:4000");

        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));

        unsafe {
            env::remove_var("PORT");
            env::remove_var("CACHE_TTL_MS");
            env::remove_var("LOG_LEVEL");
        }
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let mut config = Config {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            json_logs: false,
            debug_requests: false,
            plebiscite: None,
        };

        let cli = Cli {
            port: Some(8080),
            log_level: Some("trace".to_owned()),
            json_logs: true,
            debug_requests: true,
        };
        config.apply_cli(&cli);

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "trace");
        assert!(config.json_logs);
        assert!(config.debug_requests);
    }
}
