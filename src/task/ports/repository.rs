//! Repository port for the ordered task collection.

use crate::task::domain::{
    MoveDirection, MoveOutcome, NewTask, Task, TaskChanges, TaskId, UniqueField,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every mutating operation is atomic: it either commits completely or
/// leaves the collection untouched.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns all tasks ordered ascending by presentation order.
    async fn list(&self) -> TaskRepositoryResult<Vec<Task>>;

    /// Inserts a task and returns it with its assigned identifier.
    ///
    /// When the task carries no order, the next order is allocated while
    /// the whole collection is locked against concurrent allocations.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::UniqueViolation`] when the name or the
    /// explicit order is already taken.
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task>;

    /// Replaces the name, cost and due date of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::UniqueViolation`] when the name is taken.
    async fn update(&self, id: TaskId, changes: TaskChanges) -> TaskRepositoryResult<Task>;

    /// Removes a task without renumbering the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Exchanges a task's order with its neighbour in `direction`.
    ///
    /// Returns [`MoveOutcome::AtBoundary`] without changes when no neighbour
    /// exists in that direction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn move_task(
        &self,
        id: TaskId,
        direction: MoveDirection,
    ) -> TaskRepositoryResult<MoveOutcome>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A unique constraint rejected the write; the transaction was rolled
    /// back.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueField),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
