// Sequential multi-context transaction manager
use crate::error::Result;
use crate::port::{Context, Task, TaskRegistry};
use crate::LOG_TARGET;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs registered tasks one at a time, in registration order
///
/// Every context touched by the sequence is initialized lazily before its
/// first task runs. All contexts are committed when every task succeeds;
/// the first failure stops the sequence and rolls every context back.
#[derive(Default)]
pub struct MultiTxnManager {
    tasks: Vec<Arc<dyn Task>>,
}

impl MultiTxnManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting for `exec`
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Run the pending sequence and settle every participating context
    ///
    /// Returns the executed tasks so callers can read their results.
    ///
    /// # Errors
    /// - the failing task's (or context init's) original error, after rollback
    /// - the failing commit's error, after rolling back the remaining contexts
    pub async fn exec(&mut self) -> Result<Vec<Arc<dyn Task>>> {
        let tasks = std::mem::take(&mut self.tasks);
        let mut contexts: Vec<Arc<dyn Context>> = Vec::new();

        for task in &tasks {
            let context = task.context();
            if !contexts.iter().any(|known| known.id() == context.id()) {
                contexts.push(Arc::clone(&context));
            }

            if let Err(err) = Self::run_task(context.as_ref(), task.as_ref()).await {
                warn!(
                    target: LOG_TARGET,
                    context = %context.name(),
                    error = %err,
                    "Task failed, rolling back all contexts"
                );
                Self::rollback_all(&contexts).await;
                return Err(err);
            }
        }

        Self::commit_all(&contexts).await?;

        info!(
            target: LOG_TARGET,
            tasks = tasks.len(),
            contexts = contexts.len(),
            "Transaction sequence committed"
        );
        Ok(tasks)
    }

    async fn run_task(context: &dyn Context, task: &dyn Task) -> Result<()> {
        if !context.is_initialized() {
            context.init().await?;
        }
        task.exec().await
    }

    async fn commit_all(contexts: &[Arc<dyn Context>]) -> Result<()> {
        for (index, context) in contexts.iter().enumerate() {
            if let Err(err) = context.commit().await {
                warn!(
                    target: LOG_TARGET,
                    context = %context.name(),
                    error = %err,
                    "Commit failed, rolling back remaining contexts"
                );
                Self::rollback_all(&contexts[index + 1..]).await;
                return Err(err);
            }
        }
        Ok(())
    }

    // Rollback failures are logged only; the error that triggered the rollback wins
    async fn rollback_all(contexts: &[Arc<dyn Context>]) {
        for context in contexts {
            if !context.is_initialized() {
                debug!(target: LOG_TARGET, context = %context.name(), "Skipping rollback, not initialized");
                continue;
            }
            if let Err(err) = context.rollback().await {
                error!(
                    target: LOG_TARGET,
                    context = %context.name(),
                    error = %err,
                    "Rollback failed"
                );
            }
        }
    }
}

impl TaskRegistry for MultiTxnManager {
    fn add_task(&mut self, task: Arc<dyn Task>) {
        self.tasks.push(task);
    }
}
