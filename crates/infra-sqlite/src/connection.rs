// SQLite Connection Pool Setup

use crate::map_sqlx_error;
use mtxn_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Pool settings; everything else about the pool is the caller's business
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub busy_timeout: Duration,
    /// Use WAL journaling
    pub wal: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            wal: true,
        }
    }
}

impl PoolConfig {
    /// Read `MTXN_DB_MAX_CONNECTIONS` and `MTXN_DB_BUSY_TIMEOUT_MS`
    ///
    /// Missing or unparseable values keep the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_connections = std::env::var("MTXN_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_connections);

        let busy_timeout = std::env::var("MTXN_DB_BUSY_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.busy_timeout);

        Self {
            max_connections,
            busy_timeout,
            ..defaults
        }
    }
}

/// Create a connected SQLite pool with foreign keys enabled
pub async fn create_pool(database_url: &str, config: &PoolConfig) -> Result<SqlitePool> {
    let journal_mode = if config.wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Validation(format!("invalid database url {}: {}", database_url, e)))?
        .journal_mode(journal_mode)
        .busy_timeout(config.busy_timeout)
        .foreign_keys(true)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}
