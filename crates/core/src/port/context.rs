// Context port: one transactional resource driven by the orchestrator

use crate::error::Result;
use async_trait::async_trait;

/// A transactional resource participating in a multi-resource sequence
///
/// Implementations own at most one live transaction handle at a time.
#[async_trait]
pub trait Context: Send + Sync {
    /// Process-unique identifier, stable for the context's lifetime
    fn id(&self) -> &str;

    /// Diagnostic label including the identifier
    fn name(&self) -> String;

    /// Begin a new transaction
    ///
    /// # Errors
    /// - `AppError::AlreadyInitialized` if a transaction is already active
    /// - `AppError::Driver` if the resource fails to begin
    async fn init(&self) -> Result<()>;

    /// Commit the live transaction; the handle is discarded on either outcome
    ///
    /// # Errors
    /// - `AppError::NotInitialized` if no transaction is active
    /// - `AppError::Driver` if the commit itself fails
    async fn commit(&self) -> Result<()>;

    /// Roll back the live transaction; the handle is discarded on either outcome
    ///
    /// # Errors
    /// - `AppError::NotInitialized` if no transaction is active
    /// - `AppError::Driver` if the rollback itself fails
    async fn rollback(&self) -> Result<()>;

    /// True iff a transaction is active
    ///
    /// Must not wait on the transaction itself; a running task may ask.
    fn is_initialized(&self) -> bool;
}
