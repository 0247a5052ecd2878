//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is not a non-negative integer.
    #[error("invalid task identifier '{0}', expected a non-negative integer")]
    InvalidTaskId(String),

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The task cost is below zero.
    #[error("task cost must not be negative")]
    NegativeCost,

    /// No presentation order value remains above the current maximum.
    #[error("presentation order space exhausted")]
    OrderSpaceExhausted,
}

/// Error returned while parsing a move direction token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown move direction: {0}")]
pub struct ParseMoveDirectionError(pub String);
