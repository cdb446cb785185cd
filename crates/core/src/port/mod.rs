// Port Layer - Interfaces between resources, tasks and the orchestrator

pub mod context;
pub mod id_provider; // For deterministic testing
pub mod task;

// Re-exports
pub use context::Context;
pub use id_provider::{IdProvider, UuidProvider};
pub use task::{Task, TaskRegistry};
