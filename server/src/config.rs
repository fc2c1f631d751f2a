//! Server configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use thiserror::Error;

/// Default listen port, on all interfaces.
pub const DEFAULT_PORT: u16 = 3000;

/// Default session lifetime in days.
pub const DEFAULT_SESSION_DAYS: i64 = 30;

/// Default request budget per client per minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Default request budget per client per minute on register/login.
pub const DEFAULT_AUTH_RATE_LIMIT_PER_MINUTE: u32 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_days: i64,
    pub rate_limit_per_minute: u32,
    pub auth_rate_limit_per_minute: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`: PostgreSQL connection string
    ///
    /// Optional:
    /// - `PROCOOK_BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `PROCOOK_SESSION_DAYS`: session lifetime in days (default: 30)
    /// - `PROCOOK_RATE_LIMIT_PER_MINUTE`: general API budget (default: 60)
    /// - `PROCOOK_AUTH_RATE_LIMIT_PER_MINUTE`: register/login budget (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let bind_addr = parse_or("PROCOOK_BIND_ADDR", &lookup, || {
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
        })?;
        let session_days = parse_or("PROCOOK_SESSION_DAYS", &lookup, || DEFAULT_SESSION_DAYS)?;
        let rate_limit_per_minute = parse_or("PROCOOK_RATE_LIMIT_PER_MINUTE", &lookup, || {
            DEFAULT_RATE_LIMIT_PER_MINUTE
        })?;
        let auth_rate_limit_per_minute =
            parse_or("PROCOOK_AUTH_RATE_LIMIT_PER_MINUTE", &lookup, || {
                DEFAULT_AUTH_RATE_LIMIT_PER_MINUTE
            })?;

        if session_days <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "PROCOOK_SESSION_DAYS".to_string(),
                value: session_days.to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            session_days,
            rate_limit_per_minute,
            auth_rate_limit_per_minute,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        None => Ok(default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(config.database_url, "postgres://x");
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.session_days, DEFAULT_SESSION_DAYS);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.auth_rate_limit_per_minute, 10);
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("PROCOOK_BIND_ADDR", "127.0.0.1:8080"),
            ("PROCOOK_SESSION_DAYS", "7"),
            ("PROCOOK_RATE_LIMIT_PER_MINUTE", "120"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.session_days, 7);
        assert_eq!(config.rate_limit_per_minute, 120);
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("PROCOOK_SESSION_DAYS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_non_positive_session_days() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("PROCOOK_SESSION_DAYS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
