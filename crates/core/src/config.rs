//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services behind an
//! `Arc`. Nothing in the request path reads process-wide environment variables.

use crate::constants::{
    DEFAULT_JWT_EXPIRY_HOURS, DEFAULT_PORT, DEFAULT_UTC_OFFSET, DEV_JWT_SECRET, HOSPITAL_NAME,
};
use crate::{HisError, HisResult};
use chrono::FixedOffset;
use std::net::SocketAddr;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> HisResult<Self> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("development") | Some("dev") => Ok(Self::Development),
            Some("test") => Ok(Self::Test),
            Some("production") | Some("prod") => Ok(Self::Production),
            Some(other) => Err(HisError::Config(format!("unknown APP_ENV '{other}'"))),
        }
    }
}

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(String),
    Memory,
}

/// Configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    environment: Environment,
    database_url: Option<String>,
    jwt_secret: String,
    jwt_expiry_hours: i64,
    bind_addr: SocketAddr,
    utc_offset: FixedOffset,
    hospital_name: String,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Call after `dotenvy::dotenv()` so `.env` values are visible.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> HisResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// Recognised keys: `APP_ENV`, `DATABASE_URL`, `JWT_SECRET`, `JWT_EXPIRY_HOURS`, `PORT`,
    /// `HIS_REST_ADDR`, `HIS_UTC_OFFSET` and `HIS_HOSPITAL_NAME`.
    ///
    /// # Errors
    ///
    /// Returns `HisError::Config` if a value fails to parse, or if production is missing
    /// `DATABASE_URL` or `JWT_SECRET`.
    pub fn from_lookup<F>(lookup: F) -> HisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::parse(non_blank("APP_ENV").as_deref())?;
        let database_url = non_blank("DATABASE_URL");

        let jwt_secret = match (non_blank("JWT_SECRET"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Production) => {
                return Err(HisError::Config("JWT_SECRET must be set in production".into()))
            }
            (None, _) => DEV_JWT_SECRET.to_owned(),
        };

        if environment == Environment::Production && database_url.is_none() {
            return Err(HisError::Config(
                "DATABASE_URL must be set in production".into(),
            ));
        }

        let jwt_expiry_hours = match non_blank("JWT_EXPIRY_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| HisError::Config(format!("invalid JWT_EXPIRY_HOURS '{raw}'")))?,
            None => DEFAULT_JWT_EXPIRY_HOURS,
        };

        let bind_addr = match (non_blank("HIS_REST_ADDR"), non_blank("PORT")) {
            (Some(addr), _) => addr
                .trim()
                .parse::<SocketAddr>()
                .map_err(|e| HisError::Config(format!("invalid HIS_REST_ADDR '{addr}': {e}")))?,
            (None, Some(port)) => {
                let port = port
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| HisError::Config(format!("invalid PORT '{port}': {e}")))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        };

        let offset_raw = non_blank("HIS_UTC_OFFSET").unwrap_or_else(|| DEFAULT_UTC_OFFSET.into());
        let utc_offset = parse_utc_offset(&offset_raw)?;

        let hospital_name = non_blank("HIS_HOSPITAL_NAME").unwrap_or_else(|| HOSPITAL_NAME.into());

        Ok(Self {
            environment,
            database_url,
            jwt_secret,
            jwt_expiry_hours,
            bind_addr,
            utc_offset,
            hospital_name,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
    pub fn store_backend(&self) -> StoreBackend {
        match &self.database_url {
            Some(url) => StoreBackend::Postgres(url.clone()),
            None => StoreBackend::Memory,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn jwt_expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt_expiry_hours)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    pub fn hospital_name(&self) -> &str {
        &self.hospital_name
    }
}

/// Parses `+HH:MM` / `-HH:MM` into a fixed offset.
fn parse_utc_offset(raw: &str) -> HisResult<FixedOffset> {
    let invalid = || HisError::Config(format!("invalid HIS_UTC_OFFSET '{raw}'"));
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> HisResult<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_outside_production() {
        let cfg = config_from(&[]).expect("defaults should resolve");
        assert_eq!(cfg.environment(), Environment::Development);
        assert_eq!(cfg.store_backend(), StoreBackend::Memory);
        assert_eq!(cfg.jwt_secret(), DEV_JWT_SECRET);
        assert_eq!(cfg.bind_addr().port(), DEFAULT_PORT);
        assert_eq!(cfg.utc_offset().local_minus_utc(), 19_800);
    }

    #[test]
    fn test_production_requires_secret_and_database() {
        let err = config_from(&[("APP_ENV", "production"), ("DATABASE_URL", "postgres://x")])
            .expect_err("missing secret should fail");
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = config_from(&[("APP_ENV", "production"), ("JWT_SECRET", "s")])
            .expect_err("missing database should fail");
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_rest_addr_overrides_port() {
        let cfg = config_from(&[("PORT", "8080"), ("HIS_REST_ADDR", "127.0.0.1:9000")])
            .expect("config should resolve");
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000".parse().expect("addr"));

        let cfg = config_from(&[("PORT", "8080")]).expect("config should resolve");
        assert_eq!(cfg.bind_addr().port(), 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("JWT_EXPIRY_HOURS", "0")]).is_err());
        assert!(config_from(&[("APP_ENV", "staging")]).is_err());
        assert!(config_from(&[("HIS_UTC_OFFSET", "0530")]).is_err());
    }

    #[test]
    fn test_negative_offset() {
        let cfg = config_from(&[("HIS_UTC_OFFSET", "-04:00")]).expect("config should resolve");
        assert_eq!(cfg.utc_offset().local_minus_utc(), -14_400);
    }
}
