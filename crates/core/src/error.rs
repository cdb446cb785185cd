// Central Error Type for the Adapter

use thiserror::Error;

/// Boxed error carrying the original failure object of a driver or user function
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Context already initialised: {0}")]
    AlreadyInitialized(String),

    #[error("Context not initialised: {0}")]
    NotInitialized(String),

    /// Failure surfaced by the underlying connection, transaction or query.
    /// The source is the driver's own error value, never re-formatted.
    #[error("Driver error: {0}")]
    Driver(#[source] BoxError),

    /// The transaction is lent to a task that is still running
    #[error("Transaction in use by a running task: {0}")]
    TransactionInUse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),
}

impl AppError {
    /// Wrap any driver-level error without translating it
    pub fn driver(err: impl Into<BoxError>) -> Self {
        AppError::Driver(err.into())
    }

    /// Borrow the original driver error, if this is a driver failure
    pub fn driver_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            AppError::Driver(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
