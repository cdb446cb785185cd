// Shared fixtures for unit tests

use crate::{create_pool, PoolConfig};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh on-disk database with `test_table(id, name)`; keep the TempDir alive
pub(crate) async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mtxn.db");
    let pool = create_pool(path.to_str().unwrap(), &PoolConfig::default())
        .await
        .unwrap();

    sqlx::query("CREATE TABLE test_table (id NUMERIC(38) PRIMARY KEY, name VARCHAR(100))")
        .execute(&pool)
        .await
        .unwrap();

    (dir, pool)
}

pub(crate) async fn count_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM test_table")
        .fetch_one(pool)
        .await
        .unwrap()
}
