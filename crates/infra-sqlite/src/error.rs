// sqlx::Error -> AppError

use mtxn_core::error::AppError;
use mtxn_core::LOG_TARGET;
use tracing::debug;

/// Wrap a driver error as `AppError::Driver`, keeping the original value
///
/// Function tasks use this with `?` on their own sqlx calls.
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        debug!(
            target: LOG_TARGET,
            code = ?db_err.code(),
            message = %db_err.message(),
            "Database reported an error"
        );
    }
    AppError::driver(err)
}
