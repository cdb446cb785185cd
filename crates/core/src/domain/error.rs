// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid binding @{name}: {reason}")]
    InvalidBinding { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
