//! Transaction isolation levels.
//!
//! SQLite transactions are always serializable against other connections.
//! The only knob is `PRAGMA read_uncommitted`, which lets a connection
//! using a shared cache read uncommitted changes of other connections.

use std::fmt;

/// Isolation level captured by a context and applied at `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

impl IsolationLevel {
    /// Statement run inside the freshly begun transaction.
    pub fn pragma(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "PRAGMA read_uncommitted = 1",
            _ => "PRAGMA read_uncommitted = 0",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::ReadUncommitted => write!(f, "READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
            IsolationLevel::Snapshot => write!(f, "SNAPSHOT"),
        }
    }
}
