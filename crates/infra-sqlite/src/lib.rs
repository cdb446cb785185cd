// MultiTxnMngr Infrastructure - SQLite Adapter
// Implements: Context (SqliteDbContext), Task (SqliteDbTask)

mod connection;
mod context;
mod error;
mod isolation;
mod params;
mod query;
mod task;

pub use connection::{create_pool, PoolConfig};
pub use context::{SqliteDbContext, SqliteTransaction, TransactionLease};
pub use error::map_sqlx_error;
pub use isolation::IsolationLevel;
pub use query::execute_query;
pub use task::{SqliteDbTask, TaskFn};

// Note: sqlx::Error conversion goes through map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)

#[cfg(test)]
mod test_support;
