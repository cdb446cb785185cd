// Application Layer - Orchestration of tasks across contexts

pub mod txn_manager;

// Re-exports
pub use txn_manager::MultiTxnManager;
