// Domain Layer - SQL values, bindings, results and lifecycle states

pub mod error;
pub mod result;
pub mod sql;
pub mod state;

pub use error::DomainError;
pub use result::{QueryResult, Row};
pub use sql::{Binding, ParamSource, SqlType, SqlValue};
pub use state::{ContextPhase, TaskState};
