// Shared setup for end-to-end tests

#![allow(dead_code)]

use mtxn_core::domain::{Binding, ParamSource, SqlType};
use mtxn_infra_sqlite::{create_pool, PoolConfig};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub const INSERT_SQL: &str = "INSERT INTO test_table(id, name) VALUES (@id, @name)";

/// Route `MultiTxnMngr` events to the test output; safe to call from every test
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("MultiTxnMngr=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Connected pool over a fresh database holding an empty `test_table`
pub async fn setup_db() -> (TempDir, SqlitePool) {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mtxnmngr.db");
    let pool = create_pool(path.to_str().unwrap(), &PoolConfig::default())
        .await
        .unwrap();

    sqlx::query("CREATE TABLE test_table (id NUMERIC(38) PRIMARY KEY, name VARCHAR(100))")
        .execute(&pool)
        .await
        .unwrap();

    (dir, pool)
}

pub fn person(id: i64, name: &str) -> ParamSource {
    ParamSource::literal([
        Binding::new("id", SqlType::Numeric(38), id),
        Binding::new("name", SqlType::VarChar(100), name),
    ])
}

/// Committed rows, ordered by id
pub async fn rows(pool: &SqlitePool) -> Vec<(i64, String)> {
    sqlx::query_as("SELECT id, name FROM test_table ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}
