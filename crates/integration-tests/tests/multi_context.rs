//! Several databases settled together by one manager.

mod common;

use common::{person, rows, setup_db, INSERT_SQL};
use mtxn_core::application::MultiTxnManager;
use mtxn_core::domain::ContextPhase;
use mtxn_core::error::AppError;
use mtxn_core::port::{Context, Task};
use mtxn_infra_sqlite::{IsolationLevel, SqliteDbContext};

#[tokio::test]
async fn test_all_contexts_commit_together() {
    let (_dir_a, pool_a) = setup_db().await;
    let (_dir_b, pool_b) = setup_db().await;

    let mut txn_mngr = MultiTxnManager::new();
    let orders = SqliteDbContext::new(pool_a.clone());
    let audit = SqliteDbContext::with_isolation_level(pool_b.clone(), IsolationLevel::Serializable);

    orders.add_task(&mut txn_mngr, INSERT_SQL, Some(person(1, "Dave")));
    audit.add_task(&mut txn_mngr, INSERT_SQL, Some(person(1, "order 1 placed")));
    orders.add_task(&mut txn_mngr, INSERT_SQL, Some(person(2, "Kevin")));

    txn_mngr.exec().await.unwrap();

    assert_eq!(orders.phase(), ContextPhase::Closed);
    assert_eq!(audit.phase(), ContextPhase::Closed);
    assert_eq!(rows(&pool_a).await.len(), 2);
    assert_eq!(rows(&pool_b).await, vec![(1, "order 1 placed".to_string())]);
}

#[tokio::test]
async fn test_failure_in_one_context_rolls_back_the_other() {
    let (_dir_a, pool_a) = setup_db().await;
    let (_dir_b, pool_b) = setup_db().await;

    let mut txn_mngr = MultiTxnManager::new();
    let orders = SqliteDbContext::new(pool_a.clone());
    let audit = SqliteDbContext::new(pool_b.clone());

    let placed = orders.add_task(&mut txn_mngr, INSERT_SQL, Some(person(1, "Dave")));
    audit.add_task(&mut txn_mngr, "INSERT INTO missing_table VALUES (1)", None);

    let err = txn_mngr.exec().await.map(|tasks| tasks.len()).unwrap_err();
    assert!(matches!(err, AppError::Driver(_)));

    assert!(placed.result().is_some());
    assert!(!orders.is_initialized());
    assert!(!audit.is_initialized());
    assert!(rows(&pool_a).await.is_empty());
    assert!(rows(&pool_b).await.is_empty());
}

#[tokio::test]
async fn test_caller_initialized_context_is_used_as_is() {
    let (_dir, pool) = setup_db().await;

    let mut txn_mngr = MultiTxnManager::new();
    let ctx = SqliteDbContext::new(pool.clone());
    ctx.init().await.unwrap();

    ctx.add_task(&mut txn_mngr, INSERT_SQL, Some(person(3, "Early")));
    txn_mngr.exec().await.unwrap();

    assert_eq!(rows(&pool).await, vec![(3, "Early".to_string())]);
}
