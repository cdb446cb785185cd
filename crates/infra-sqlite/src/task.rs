// SQLite Task: one query or one user function, executed once

use crate::context::{SqliteDbContext, SqliteTransaction};
use crate::query::execute_query;
use async_trait::async_trait;
use futures::future::BoxFuture;
use mtxn_core::domain::{DomainError, ParamSource, QueryResult, TaskState};
use mtxn_core::error::{AppError, Result};
use mtxn_core::port::{Context, Task};
use mtxn_core::LOG_TARGET;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// User work run against the live transaction; may read its own task
///
/// The context's transaction is leased to the task while this runs: use the
/// handle passed in. The context can still report its phase, but
/// `get_transaction`, `commit` and `rollback` fail with `TransactionInUse`.
pub type TaskFn = Box<
    dyn for<'a> Fn(&'a mut SqliteTransaction, &'a SqliteDbTask) -> BoxFuture<'a, Result<Option<QueryResult>>>
        + Send
        + Sync,
>;

enum TaskPayload {
    Query {
        sql: String,
        params: Mutex<Option<ParamSource>>,
    },
    Function(TaskFn),
}

enum Execution {
    Pending,
    Executing,
    Succeeded(Option<Arc<QueryResult>>),
    Failed,
}

impl Execution {
    fn state(&self) -> TaskState {
        match self {
            Execution::Pending => TaskState::Pending,
            Execution::Executing => TaskState::Executing,
            Execution::Succeeded(_) => TaskState::Succeeded,
            Execution::Failed => TaskState::Failed,
        }
    }
}

/// Unit of work bound to a `SqliteDbContext`
///
/// Created through `SqliteDbContext::add_task` / `add_function_task`.
pub struct SqliteDbTask {
    context: Arc<SqliteDbContext>,
    payload: TaskPayload,
    execution: Mutex<Execution>,
}

impl SqliteDbTask {
    pub(crate) fn query(context: Arc<SqliteDbContext>, sql: String, params: Option<ParamSource>) -> Self {
        Self::new(
            context,
            TaskPayload::Query {
                sql,
                params: Mutex::new(params),
            },
        )
    }

    pub(crate) fn function(context: Arc<SqliteDbContext>, exec_fn: TaskFn) -> Self {
        Self::new(context, TaskPayload::Function(exec_fn))
    }

    fn new(context: Arc<SqliteDbContext>, payload: TaskPayload) -> Self {
        Self {
            context,
            payload,
            execution: Mutex::new(Execution::Pending),
        }
    }

    /// Statement text, for query tasks
    pub fn sql(&self) -> Option<&str> {
        match &self.payload {
            TaskPayload::Query { sql, .. } => Some(sql),
            TaskPayload::Function(_) => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.payload, TaskPayload::Function(_))
    }

    pub fn db_context(&self) -> &Arc<SqliteDbContext> {
        &self.context
    }

    /// Replace the parameter source of a query task
    ///
    /// # Errors
    /// - `AppError::Validation` for function tasks, which take no parameters
    pub fn set_params(&self, params: ParamSource) -> Result<()> {
        match &self.payload {
            TaskPayload::Query { params: slot, .. } => {
                *slot.lock() = Some(params);
                Ok(())
            }
            TaskPayload::Function(_) => Err(AppError::Validation(
                "function tasks do not take parameters".to_string(),
            )),
        }
    }

    fn start(&self) -> Result<()> {
        let mut execution = self.execution.lock();
        let from = execution.state();
        if !from.can_transition_to(TaskState::Executing) {
            return Err(DomainError::InvalidStateTransition {
                from: from.to_string(),
                to: TaskState::Executing.to_string(),
            }
            .into());
        }
        *execution = Execution::Executing;
        Ok(())
    }

    async fn run(&self) -> Result<Option<QueryResult>> {
        match &self.payload {
            TaskPayload::Query { sql, params } => {
                // Deferred producers run now, after every earlier task has finished
                let source = params.lock().clone();
                let bindings = source.map(|source| source.resolve());

                let mut txn = self.context.get_transaction()?;
                execute_query(&mut txn, sql, bindings.as_deref())
                    .await
                    .map(Some)
            }
            TaskPayload::Function(exec_fn) => {
                let mut txn = self.context.get_transaction()?;
                exec_fn(&mut *txn, self).await
            }
        }
    }
}

#[async_trait]
impl Task for SqliteDbTask {
    async fn exec(&self) -> Result<()> {
        self.start()?;
        let kind = if self.is_function() { "function" } else { "query" };
        debug!(target: LOG_TARGET, context = %self.context.name(), kind, "Executing task");

        let outcome = self.run().await;

        let mut execution = self.execution.lock();
        match outcome {
            Ok(result) => {
                *execution = Execution::Succeeded(result.map(Arc::new));
                Ok(())
            }
            Err(err) => {
                *execution = Execution::Failed;
                Err(err)
            }
        }
    }

    fn context(&self) -> Arc<dyn Context> {
        self.context.clone()
    }

    fn result(&self) -> Option<Arc<QueryResult>> {
        match &*self.execution.lock() {
            Execution::Succeeded(result) => result.clone(),
            _ => None,
        }
    }

    fn state(&self) -> TaskState {
        self.execution.lock().state()
    }
}
