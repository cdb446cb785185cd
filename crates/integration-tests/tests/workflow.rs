//! End-to-end workflows: commit on success, rollback on failure,
//! and handle sharing between function and query tasks.

mod common;

use common::{person, rows, setup_db, INSERT_SQL};
use mtxn_core::application::MultiTxnManager;
use mtxn_core::domain::{ContextPhase, QueryResult, SqlValue, TaskState};
use mtxn_core::error::AppError;
use mtxn_core::port::Task;
use mtxn_infra_sqlite::{execute_query, SqliteDbContext};

/// Scenario A: delete + insert, everything commits
#[tokio::test]
async fn test_success_commit_case() {
    let (_dir, pool) = setup_db().await;
    sqlx::query("INSERT INTO test_table(id, name) VALUES (5, 'Old')")
        .execute(&pool)
        .await
        .unwrap();

    let mut txn_mngr = MultiTxnManager::new();
    let ctx = SqliteDbContext::new(pool.clone());

    let delete = ctx.add_task(&mut txn_mngr, "DELETE FROM test_table", None);
    let insert = ctx.add_task(&mut txn_mngr, INSERT_SQL, Some(person(1, "Dave")));

    let executed = txn_mngr.exec().await.unwrap();
    assert_eq!(executed.len(), 2);

    assert_eq!(ctx.phase(), ContextPhase::Closed);
    assert_eq!(delete.state(), TaskState::Succeeded);
    assert_eq!(delete.result().unwrap().rows_affected, 1);
    assert_eq!(insert.result().unwrap().rows_affected, 1);
    assert_eq!(rows(&pool).await, vec![(1, "Dave".to_string())]);
}

/// Scenario B: the duplicate key in the third task rolls everything back
#[tokio::test]
async fn test_fail_rollback_case() {
    let (_dir, pool) = setup_db().await;
    sqlx::query("INSERT INTO test_table(id, name) VALUES (99, 'Seed')")
        .execute(&pool)
        .await
        .unwrap();

    let mut txn_mngr = MultiTxnManager::new();
    let ctx = SqliteDbContext::new(pool.clone());

    let delete = ctx.add_task(&mut txn_mngr, "DELETE FROM test_table", None);
    let first = ctx.add_task(&mut txn_mngr, INSERT_SQL, Some(person(1, "Dave")));
    let duplicate = ctx.add_task(&mut txn_mngr, INSERT_SQL, Some(person(1, "Kevin")));
    // Should never execute
    let never = ctx.add_function_task(&mut txn_mngr, |_txn, _task| {
        Box::pin(async move {
            Err::<Option<QueryResult>, _>(AppError::Validation("must not run".to_string()))
        })
    });

    let err = txn_mngr.exec().await.map(|tasks| tasks.len()).unwrap_err();
    let db_err = match err {
        AppError::Driver(source) => *source.downcast::<sqlx::Error>().unwrap(),
        other => panic!("expected driver failure, got {other:?}"),
    };
    match db_err {
        sqlx::Error::Database(e) => assert!(e.message().contains("UNIQUE constraint failed")),
        other => panic!("expected a constraint violation, got {other:?}"),
    }

    assert_eq!(ctx.phase(), ContextPhase::Closed);
    assert_eq!(delete.state(), TaskState::Succeeded);
    assert_eq!(first.state(), TaskState::Succeeded);
    assert_eq!(duplicate.state(), TaskState::Failed);
    assert!(duplicate.result().is_none());
    assert_eq!(never.state(), TaskState::Pending);

    // Neither the delete nor the first insert is visible
    assert_eq!(rows(&pool).await, vec![(99, "Seed".to_string())]);
}

/// Scenario C: a raw insert from a function task is visible to a later query task
#[tokio::test]
async fn test_function_task_shares_transaction() {
    let (_dir, pool) = setup_db().await;

    let mut txn_mngr = MultiTxnManager::new();
    let ctx = SqliteDbContext::new(pool.clone());

    ctx.add_task(&mut txn_mngr, "DELETE FROM test_table", None);
    ctx.add_function_task(&mut txn_mngr, |txn, _task| {
        Box::pin(async move {
            execute_query(txn, "INSERT INTO test_table(id, name) VALUES (1, 'Stuart')", None)
                .await
                .map(Some)
        })
    });
    let control = ctx.add_task(&mut txn_mngr, "SELECT * FROM test_table", None);

    txn_mngr.exec().await.unwrap();

    let result = control.result().unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("Name"), Some(&SqlValue::from("Stuart")));
    assert_eq!(rows(&pool).await, vec![(1, "Stuart".to_string())]);
}

/// A function that returns nothing still succeeds, with no result
#[tokio::test]
async fn test_function_task_without_result() {
    let (_dir, pool) = setup_db().await;

    let mut txn_mngr = MultiTxnManager::new();
    let ctx = SqliteDbContext::new(pool);

    let task = ctx.add_function_task(&mut txn_mngr, |_txn, _task| {
        Box::pin(async move { Ok::<Option<QueryResult>, AppError>(None) })
    });

    txn_mngr.exec().await.unwrap();
    assert_eq!(task.state(), TaskState::Succeeded);
    assert!(task.result().is_none());
}

/// A context can run a second sequence once the first has closed it
#[tokio::test]
async fn test_context_reused_across_sequences() {
    let (_dir, pool) = setup_db().await;
    let ctx = SqliteDbContext::new(pool.clone());

    let mut first = MultiTxnManager::new();
    ctx.add_task(&mut first, INSERT_SQL, Some(person(1, "Dave")));
    first.exec().await.unwrap();

    let mut second = MultiTxnManager::new();
    ctx.add_task(&mut second, INSERT_SQL, Some(person(2, "Kevin")));
    second.exec().await.unwrap();

    assert_eq!(
        rows(&pool).await,
        vec![(1, "Dave".to_string()), (2, "Kevin".to_string())]
    );
}
