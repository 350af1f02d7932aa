//! Server configuration from the environment.

use std::ops::RangeInclusive;
use std::str::FromStr;

use axum::http::HeaderValue;
use noteful_crypto::HashParams;
use noteful_db::PoolConfig;
use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/noteful";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 168;
/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_LIFETIME_HOURS: i64 = 24 * 366;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Raw CORS origins; see [`parse_allowed_origins`].
    pub allowed_origins: Vec<String>,
    /// Always within `1..=MAX_SESSION_LIFETIME_HOURS`.
    pub session_lifetime_hours: i64,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub hash_params: HashParams,
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            session_lifetime_hours: DEFAULT_SESSION_LIFETIME_HOURS,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_acquire_timeout_secs: DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            hash_params: HashParams::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ApiConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unset keys use defaults;
    /// unparseable numbers use defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let hash_defaults = defaults.hash_params;

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(raw) if !raw.trim().is_empty() => split_origins(&raw),
            _ => defaults.allowed_origins,
        };

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            allowed_origins,
            session_lifetime_hours: parse_in_range(
                &lookup,
                "SESSION_LIFETIME_HOURS",
                1..=MAX_SESSION_LIFETIME_HOURS,
                defaults.session_lifetime_hours,
            ),
            db_max_connections: parse_in_range(
                &lookup,
                "DB_MAX_CONNECTIONS",
                1..=u32::MAX,
                defaults.db_max_connections,
            ),
            db_acquire_timeout_secs: parse_in_range(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                1..=u64::MAX,
                defaults.db_acquire_timeout_secs,
            ),
            hash_params: HashParams {
                memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", hash_defaults.memory_kib),
                iterations: parse_or(
                    &lookup,
                    "PASSWORD_HASH_ITERATIONS",
                    hash_defaults.iterations,
                ),
                parallelism: parse_or(
                    &lookup,
                    "PASSWORD_HASH_PARALLELISM",
                    hash_defaults.parallelism,
                ),
            },
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes),
        }
    }

    /// Lifetime of issued session tokens.
    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.session_lifetime_hours)
            .filter(|d| *d > chrono::Duration::zero())
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_SESSION_LIFETIME_HOURS))
    }

    /// Connection pool settings for the API server.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.db_max_connections,
            acquire_timeout: std::time::Duration::from_secs(self.db_acquire_timeout_secs),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, default = %default, "Unparseable setting, using default");
                default
            }
        },
    }
}

/// Like [`parse_or`], but values outside `range` also fall back with a warning.
fn parse_in_range<T, F>(lookup: &F, key: &str, range: RangeInclusive<T>, default: T) -> T
where
    T: FromStr + std::fmt::Display + PartialOrd + Copy,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default);
    if range.contains(&value) {
        value
    } else {
        warn!(key, value = %value, default = %default, "Setting out of range, using default");
        default
    }
}

/// Turn configured origins into header values, skipping invalid ones.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}
