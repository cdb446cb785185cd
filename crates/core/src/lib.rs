// MultiTxnMngr Core - Domain Types, Ports & Orchestration
// NO database driver dependencies (hexagonal: adapters live in infra crates)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

/// `tracing` target shared by every lifecycle event of contexts and the manager
pub const LOG_TARGET: &str = "MultiTxnMngr";
