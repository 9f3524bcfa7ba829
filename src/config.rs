use base64::{engine::general_purpose, Engine as _};
use chrono::Duration;
use std::ops::RangeInclusive;
use thiserror::Error;

const SESSION_TTL_HOURS: RangeInclusive<i64> = 1..=24 * 365;
const RESET_TOKEN_TTL_MINUTES: RangeInclusive<i64> = 1..=24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{0} must be base64")]
    NotBase64(&'static str),
    #[error("{name} is not a valid number: {value}")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together")]
    PartialSeedAdmin,
}

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub session_key: Vec<u8>,
    /// Raw key bytes for `Crypto`; length is checked there.
    pub enc_key: Vec<u8>,
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub verification_token_ttl: Duration,
    pub invitation_ttl: Duration,
    pub secure_cookies: bool,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let enc_key = decode_key(&get, "APP_ENC_KEY")?;
        // Mirrors the old deployments that only carried APP_ENC_KEY.
        let session_key = match get("SESSION_KEY") {
            Some(_) => decode_key(&get, "SESSION_KEY")?,
            None => enc_key.clone(),
        };

        let bind_addr = match get("BIND_ADDR") {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", get("PORT").unwrap_or_else(|| "3000".to_string())),
        };

        let secure_cookies = ["RAILWAY_ENVIRONMENT", "RENDER", "FLY_APP_NAME", "PRODUCTION"]
            .iter()
            .any(|name| get(name).is_some());

        let seed_admin = match (get("SEED_ADMIN_EMAIL"), get("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialSeedAdmin),
        };

        Ok(Self {
            database_url,
            database_max_connections: number(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr,
            session_key,
            enc_key,
            session_ttl: Duration::hours(bounded(&get, "SESSION_TTL_HOURS", 24, SESSION_TTL_HOURS)?),
            reset_token_ttl: Duration::minutes(bounded(
                &get,
                "RESET_TOKEN_TTL_MINUTES",
                60,
                RESET_TOKEN_TTL_MINUTES,
            )?),
            verification_token_ttl: Duration::hours(48),
            invitation_ttl: Duration::days(7),
            secure_cookies,
            seed_admin,
        })
    }
}

fn decode_key<F>(get: &F, name: &'static str) -> Result<Vec<u8>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = get(name).ok_or(ConfigError::Missing(name))?;
    general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|_| ConfigError::NotBase64(name))
}

fn number<F, T>(get: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
    }
}

/// Like `number`, but rejects values outside `range`.
fn bounded<F>(
    get: &F,
    name: &'static str,
    default: i64,
    range: RangeInclusive<i64>,
) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = number(get, name, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/visa"), ("APP_ENC_KEY", KEY)]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.session_ttl, Duration::hours(24));
        assert_eq!(config.reset_token_ttl, Duration::minutes(60));
        assert_eq!(config.enc_key.len(), 32);
        assert_eq!(config.session_key, config.enc_key);
        assert!(!config.secure_cookies);
        assert!(config.seed_admin.is_none());
    }

    #[test]
    fn port_and_production_markers() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/visa"),
            ("APP_ENC_KEY", KEY),
            ("PORT", "8080"),
            ("FLY_APP_NAME", "visa"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.secure_cookies);
    }

    #[test]
    fn missing_and_invalid_values_fail() {
        assert_eq!(
            load(&[("APP_ENC_KEY", KEY)]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            load(&[("DATABASE_URL", "x"), ("APP_ENC_KEY", "not base64!")]).unwrap_err(),
            ConfigError::NotBase64("APP_ENC_KEY")
        );
        assert!(matches!(
            load(&[("DATABASE_URL", "x"), ("APP_ENC_KEY", KEY), ("SESSION_TTL_HOURS", "soon")]),
            Err(ConfigError::NotANumber { name: "SESSION_TTL_HOURS", .. })
        ));
        assert_eq!(
            load(&[("DATABASE_URL", "x"), ("APP_ENC_KEY", KEY), ("SEED_ADMIN_EMAIL", "a@b.com")])
                .unwrap_err(),
            ConfigError::PartialSeedAdmin
        );
    }

    #[test]
    fn ttl_values_are_range_checked() {
        assert_eq!(
            load(&[
                ("DATABASE_URL", "x"),
                ("APP_ENC_KEY", KEY),
                ("SESSION_TTL_HOURS", "9223372036854775807"),
            ])
            .unwrap_err(),
            ConfigError::OutOfRange {
                name: "SESSION_TTL_HOURS",
                value: i64::MAX,
                min: 1,
                max: 24 * 365,
            }
        );
        assert!(matches!(
            load(&[("DATABASE_URL", "x"), ("APP_ENC_KEY", KEY), ("RESET_TOKEN_TTL_MINUTES", "0")]),
            Err(ConfigError::OutOfRange { name: "RESET_TOKEN_TTL_MINUTES", value: 0, .. })
        ));

        let config = load(&[
            ("DATABASE_URL", "x"),
            ("APP_ENC_KEY", KEY),
            ("SESSION_TTL_HOURS", "8760"),
            ("RESET_TOKEN_TTL_MINUTES", "15"),
        ])
        .unwrap();
        assert_eq!(config.session_ttl, Duration::hours(8760));
        assert_eq!(config.reset_token_ttl, Duration::minutes(15));
    }
}
