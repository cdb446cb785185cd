// Task port: a unit of work bound to a context, executed once

use crate::domain::{QueryResult, TaskState};
use crate::error::Result;
use crate::port::Context;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Task: Send + Sync {
    /// Run the work against the owning context's current transaction
    ///
    /// Only the orchestrator calls this, exactly once. A second call fails
    /// with `DomainError::InvalidStateTransition`.
    async fn exec(&self) -> Result<()>;

    /// The context whose transaction this task runs in
    fn context(&self) -> Arc<dyn Context>;

    /// Captured result; absent before execution and after a failure
    fn result(&self) -> Option<Arc<QueryResult>>;

    fn state(&self) -> TaskState;
}

/// Registration half of the orchestrator contract
pub trait TaskRegistry {
    /// Append a task to the pending sequence
    fn add_task(&mut self, task: Arc<dyn Task>);
}
