// SQLite Context: owns one sqlx transaction at a time

use crate::isolation::IsolationLevel;
use crate::map_sqlx_error;
use crate::task::SqliteDbTask;
use async_trait::async_trait;
use futures::future::BoxFuture;
use mtxn_core::domain::{ContextPhase, ParamSource, QueryResult};
use mtxn_core::error::{AppError, Result};
use mtxn_core::port::{Context, IdProvider, TaskRegistry, UuidProvider};
use mtxn_core::LOG_TARGET;
use parking_lot::Mutex;
use sqlx::{Sqlite, SqlitePool};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

/// Live transaction handle of an active context
pub type SqliteTransaction = sqlx::Transaction<'static, Sqlite>;

// The lock is only ever held for a state swap, never across an await.
enum ContextState {
    Uninitialized,
    Active(SqliteTransaction),
    /// Still active, but the handle is out on a `TransactionLease`
    Leased,
    Closed,
}

impl ContextState {
    fn phase(&self) -> ContextPhase {
        match self {
            ContextState::Uninitialized => ContextPhase::Uninitialized,
            ContextState::Active(_) | ContextState::Leased => ContextPhase::Active,
            ContextState::Closed => ContextPhase::Closed,
        }
    }
}

#[derive(Clone, Copy)]
enum Settlement {
    Commit,
    Rollback,
}

impl Settlement {
    fn past_tense(&self) -> &'static str {
        match self {
            Settlement::Commit => "committed",
            Settlement::Rollback => "rolled back",
        }
    }
}

/// Exclusive use of a context's live transaction
///
/// The handle goes back to the context when the lease is dropped, whether
/// the work done through it succeeded or not.
pub struct TransactionLease<'a> {
    context: &'a SqliteDbContext,
    txn: Option<SqliteTransaction>,
}

impl Deref for TransactionLease<'_> {
    type Target = SqliteTransaction;

    fn deref(&self) -> &SqliteTransaction {
        self.txn.as_ref().expect("lease holds its transaction until dropped")
    }
}

impl DerefMut for TransactionLease<'_> {
    fn deref_mut(&mut self) -> &mut SqliteTransaction {
        self.txn.as_mut().expect("lease holds its transaction until dropped")
    }
}

impl Drop for TransactionLease<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            self.context.give_back(txn);
        }
    }
}

/// A SQLite database participating in a multi-transaction sequence
///
/// The pool is shared with the caller, who connects and closes it.
pub struct SqliteDbContext {
    id: String,
    pool: SqlitePool,
    isolation_level: Option<IsolationLevel>,
    state: Mutex<ContextState>,
}

impl SqliteDbContext {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Self::with_id_provider(pool, None, &UuidProvider)
    }

    pub fn with_isolation_level(pool: SqlitePool, level: IsolationLevel) -> Arc<Self> {
        Self::with_id_provider(pool, Some(level), &UuidProvider)
    }

    pub fn with_id_provider(
        pool: SqlitePool,
        isolation_level: Option<IsolationLevel>,
        ids: &dyn IdProvider,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: ids.generate_id(),
            pool,
            isolation_level,
            state: Mutex::new(ContextState::Uninitialized),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn isolation_level(&self) -> Option<IsolationLevel> {
        self.isolation_level
    }

    pub fn phase(&self) -> ContextPhase {
        self.state.lock().phase()
    }

    /// Lease the live transaction
    ///
    /// Tasks call this at execution time and never keep the handle, so they
    /// always see the context's current transaction. Only one lease exists at
    /// a time, and the context cannot be committed or rolled back while it is out.
    ///
    /// # Errors
    /// - `AppError::NotInitialized` unless the context is active
    /// - `AppError::TransactionInUse` while another lease is outstanding
    pub fn get_transaction(&self) -> Result<TransactionLease<'_>> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, ContextState::Leased) {
            ContextState::Active(txn) => Ok(TransactionLease {
                context: self,
                txn: Some(txn),
            }),
            ContextState::Leased => Err(AppError::TransactionInUse(self.name())),
            other => {
                *state = other;
                Err(AppError::NotInitialized(self.name()))
            }
        }
    }

    fn give_back(&self, txn: SqliteTransaction) {
        let mut state = self.state.lock();
        if matches!(*state, ContextState::Leased) {
            *state = ContextState::Active(txn);
        }
    }

    /// Register a SQL task; `params` may be replaced later with `set_params`
    pub fn add_task(
        self: &Arc<Self>,
        registry: &mut dyn TaskRegistry,
        sql: impl Into<String>,
        params: Option<ParamSource>,
    ) -> Arc<SqliteDbTask> {
        let task = Arc::new(SqliteDbTask::query(Arc::clone(self), sql.into(), params));
        registry.add_task(task.clone());
        task
    }

    /// Register a task running `exec_fn` against the live transaction
    pub fn add_function_task<F>(
        self: &Arc<Self>,
        registry: &mut dyn TaskRegistry,
        exec_fn: F,
    ) -> Arc<SqliteDbTask>
    where
        F: for<'a> Fn(&'a mut SqliteTransaction, &'a SqliteDbTask) -> BoxFuture<'a, Result<Option<QueryResult>>>
            + Send
            + Sync
            + 'static,
    {
        let task = Arc::new(SqliteDbTask::function(Arc::clone(self), Box::new(exec_fn)));
        registry.add_task(task.clone());
        task
    }

    async fn begin(&self) -> Result<SqliteTransaction> {
        let mut txn = self.pool.begin().await.map_err(map_sqlx_error)?;
        if let Some(level) = self.isolation_level {
            sqlx::query(level.pragma())
                .execute(&mut *txn)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(txn)
    }

    // Closed is set before the driver call, so the handle is discarded
    // whether or not the commit/rollback succeeds.
    fn take_for_settlement(&self) -> Result<SqliteTransaction> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, ContextState::Closed) {
            ContextState::Active(txn) => Ok(txn),
            ContextState::Leased => {
                *state = ContextState::Leased;
                Err(AppError::TransactionInUse(self.name()))
            }
            other => {
                *state = other;
                Err(AppError::NotInitialized(self.name()))
            }
        }
    }

    async fn settle(&self, settlement: Settlement) -> Result<()> {
        let txn = self.take_for_settlement()?;

        let outcome = match settlement {
            Settlement::Commit => txn.commit().await,
            Settlement::Rollback => txn.rollback().await,
        };

        match outcome {
            Ok(()) => {
                debug!(target: LOG_TARGET, context = %self.name(), "Context {}", settlement.past_tense());
                Ok(())
            }
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    context = %self.name(),
                    error = %err,
                    "Transaction could not be {}, handle discarded",
                    settlement.past_tense()
                );
                Err(map_sqlx_error(err))
            }
        }
    }
}

#[async_trait]
impl Context for SqliteDbContext {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> String {
        format!("SQLite DB Context: {}", self.id)
    }

    async fn init(&self) -> Result<()> {
        if self.is_initialized() {
            return Err(AppError::AlreadyInitialized(self.name()));
        }

        let txn = match self.begin().await {
            Ok(txn) => txn,
            Err(err) => {
                // Nothing began, so a closed context starts over
                let mut state = self.state.lock();
                if matches!(*state, ContextState::Closed) {
                    *state = ContextState::Uninitialized;
                }
                return Err(err);
            }
        };

        {
            let mut state = self.state.lock();
            if matches!(*state, ContextState::Active(_) | ContextState::Leased) {
                // Lost a race with a concurrent init; ours rolls back on drop
                return Err(AppError::AlreadyInitialized(self.name()));
            }
            *state = ContextState::Active(txn);
        }

        debug!(
            target: LOG_TARGET,
            context = %self.name(),
            isolation = ?self.isolation_level,
            "Transaction begun"
        );
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.settle(Settlement::Commit).await
    }

    async fn rollback(&self) -> Result<()> {
        self.settle(Settlement::Rollback).await
    }

    fn is_initialized(&self) -> bool {
        self.phase() == ContextPhase::Active
    }
}
