//! Connection configuration shared by the `PostgreSQL` adapters.
//!
//! Both [`crate::identity::adapters::postgres`] and
//! [`crate::task::adapters::postgres`] operate on the same r2d2 pool so that a
//! task unit of work can validate user identifiers inside its own
//! transaction.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::time::Duration;
use thiserror::Error;

/// `PostgreSQL` connection pool type used by every adapter.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Primary environment variable holding the connection URL.
pub const DATABASE_URL_VAR: &str = "TASKMATE_DATABASE_URL";

/// Fallback environment variable holding the connection URL.
pub const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable overriding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "TASKMATE_DB_MAX_CONNECTIONS";

/// Environment variable overriding the checkout timeout, in seconds.
pub const CONNECT_TIMEOUT_VAR: &str = "TASKMATE_DB_CONNECT_TIMEOUT_SECS";

/// Errors raised while loading configuration or building the pool.
#[derive(Debug, Error)]
pub enum DatabaseConfigError {
    /// Neither URL variable is set.
    #[error("database URL is not configured; set TASKMATE_DATABASE_URL or DATABASE_URL")]
    MissingUrl,

    /// A variable holds a value that cannot be used.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// Name of the offending variable.
        key: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    url: String,
    max_connections: u32,
    connection_timeout: Duration,
}

impl DatabaseConfig {
    /// Pool size used when none is configured.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

    /// Checkout timeout used when none is configured.
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates settings for the given URL with default pool sizing.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
        }
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets how long a checkout may wait for a free connection.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseConfigError::MissingUrl`] when no URL is set and
    /// [`DatabaseConfigError::InvalidValue`] when a numeric override does not
    /// parse.
    pub fn from_env() -> Result<Self, DatabaseConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`DatabaseConfig::from_env`].
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DatabaseConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let url = non_blank(DATABASE_URL_VAR)
            .or_else(|| non_blank(FALLBACK_DATABASE_URL_VAR))
            .ok_or(DatabaseConfigError::MissingUrl)?;

        let mut config = Self::new(url);
        if let Some(raw) = lookup(MAX_CONNECTIONS_VAR) {
            let max_connections = parse_positive(MAX_CONNECTIONS_VAR, &raw)?;
            config = config.with_max_connections(max_connections);
        }
        if let Some(raw) = lookup(CONNECT_TIMEOUT_VAR) {
            let seconds = parse_positive(CONNECT_TIMEOUT_VAR, &raw)?;
            config = config.with_connection_timeout(Duration::from_secs(u64::from(seconds)));
        }
        Ok(config)
    }

    /// Returns the connection URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the maximum number of pooled connections.
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Returns the checkout timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Builds an r2d2 pool from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseConfigError::Pool`] when the pool cannot establish
    /// its initial connections.
    pub fn build_pool(&self) -> Result<PgPool, DatabaseConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(self.url.as_str());
        let pool = Pool::builder()
            .max_size(self.max_connections)
            .connection_timeout(self.connection_timeout)
            .build(manager)?;
        Ok(pool)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u32, DatabaseConfigError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| DatabaseConfigError::InvalidValue {
            key,
            value: raw.to_owned(),
        })
}
