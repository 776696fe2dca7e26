// Server configuration
//
// Loaded from environment variables (optionally seeded from a `.env` file).

use axum::http::HeaderValue;
use pulse_storage::PoolConfig;
use std::env;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable required (or set DEV_MODE=true)")]
    MissingDatabaseUrl,
}

/// Which backend holds services and events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres { url: String },
    /// Dev mode: data lives in process memory and is lost on restart
    InMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub bind_addr: String,
    /// Normalized prefix for log routes: empty, or `/segment` without a trailing slash
    pub api_prefix: String,
    pub cors_origins: Vec<HeaderValue>,
    pub pool: PoolConfig,
    pub run_migrations: bool,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (required unless `DEV_MODE`)
    /// - `DEV_MODE`: use the in-memory store (default: false)
    /// - `BIND_ADDR`: listen address (default: 0.0.0.0:8080)
    /// - `API_PREFIX`: prefix for log routes, e.g. `/api` (default: none)
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origins (default: none)
    /// - `DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `DB_ACQUIRE_TIMEOUT_SECS`: connection acquire timeout (default: 3)
    /// - `DB_MAX_LIFETIME_SECS`: connection max lifetime (default: 1800)
    /// - `RUN_MIGRATIONS`: apply migrations at startup (default: true)
    /// - `LOG_FORMAT`: `json` or `pretty` (default: pretty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let dev_mode = lookup("DEV_MODE").map(|v| is_truthy(&v)).unwrap_or(false);

        let storage = if dev_mode {
            StorageConfig::InMemory
        } else {
            let url = lookup("DATABASE_URL")
                .filter(|s| !s.trim().is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            StorageConfig::Postgres { url }
        };

        let bind_addr = lookup("BIND_ADDR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let api_prefix = normalize_prefix(&lookup("API_PREFIX").unwrap_or_default());

        let cors_origins: Vec<HeaderValue> = lookup("CORS_ALLOWED_ORIGINS")
            .filter(|s| !s.is_empty())
            .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default();

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections),
            acquire_timeout: lookup("DB_ACQUIRE_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            max_lifetime: lookup("DB_MAX_LIFETIME_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_lifetime),
        };

        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|v| is_truthy(&v))
            .unwrap_or(true);

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            storage,
            bind_addr,
            api_prefix,
            cors_origins,
            pool,
            run_migrations,
            log_format,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// `api/` and `/api/` both become `/api`; `/` alone means no prefix.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
