//! Catalog configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional, with defaults matching the storefront's listings:
//!
//! - `CATALOG_PAGE_SIZE` - Items per numbered page (default: 25)
//! - `CATALOG_BATCH_SIZE` - Items per infinite-scroll batch (default: 20)
//! - `CATALOG_SEARCH_LIMIT` - Autocomplete result cap (default: 20)
//! - `CATALOG_SEARCH_DEBOUNCE_MS` - Autocomplete debounce (default: 300)
//! - `CATALOG_VISIBLE_PAGE_BUTTONS` - Page-button window width (default: 5)
//! - `CATALOG_FETCH_TIMEOUT_SECS` - Per-attempt fetch timeout (default: 10)
//!
//! With the `postgres` feature:
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   the generic `DATABASE_URL`)

use std::time::Duration;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Tunables for the catalog engine.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Items per page in numbered-page mode.
    pub page_size: u32,
    /// Items per batch in infinite-scroll mode.
    pub batch_size: u32,
    /// Maximum autocomplete results per query.
    pub search_limit: usize,
    /// Keystroke debounce before an autocomplete query fires.
    pub search_debounce: Duration,
    /// Width of the sliding page-button window.
    pub visible_page_buttons: u32,
    /// Per-attempt timeout for count/data fetches.
    pub fetch_timeout: Duration,
    /// Additional attempts after a failed or timed-out fetch.
    pub fetch_retries: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            batch_size: 20,
            search_limit: 20,
            search_debounce: Duration::from_millis(300),
            visible_page_buttons: 5,
            fetch_timeout: Duration::from_secs(10),
            fetch_retries: 1,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            page_size: get_parsed_or("CATALOG_PAGE_SIZE", defaults.page_size)?,
            batch_size: get_parsed_or("CATALOG_BATCH_SIZE", defaults.batch_size)?,
            search_limit: get_parsed_or("CATALOG_SEARCH_LIMIT", defaults.search_limit)?,
            search_debounce: Duration::from_millis(get_parsed_or(
                "CATALOG_SEARCH_DEBOUNCE_MS",
                300,
            )?),
            visible_page_buttons: get_parsed_or(
                "CATALOG_VISIBLE_PAGE_BUTTONS",
                defaults.visible_page_buttons,
            )?,
            fetch_timeout: Duration::from_secs(get_parsed_or("CATALOG_FETCH_TIMEOUT_SECS", 10)?),
            fetch_retries: defaults.fetch_retries,
        })
    }
}

/// Database connection settings for the Postgres-backed store.
#[cfg(feature = "postgres")]
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: secrecy::SecretString,
}

#[cfg(feature = "postgres")]
impl DatabaseConfig {
    /// Load database settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no connection URL is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(Self {
            database_url: get_database_url("CATALOG_DATABASE_URL")?,
        })
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
#[cfg(feature = "postgres")]
fn get_database_url(primary_key: &str) -> Result<secrecy::SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(secrecy::SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(secrecy::SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable parsed into `T`, or the default when unset.
fn get_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
