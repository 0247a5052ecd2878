//! Service layer orchestrating validation, storage, and error translation
//! for the ordered task collection.

use crate::task::{
    domain::{
        FieldErrors, MoveDirection, MoveOutcome, OrderPolicy, ParseMoveDirectionError, Task,
        TaskId, TaskPayload, UniqueField, validate_payload,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for task store operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// One or more payload fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The move direction token is not recognised.
    #[error(transparent)]
    InvalidDirection(#[from] ParseMoveDirectionError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A unique field collided with an existing task.
    #[error("{0}")]
    Conflict(UniqueField),

    /// Any other repository failure.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl From<TaskRepositoryError> for TaskServiceError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::NotFound(id),
            TaskRepositoryError::UniqueViolation(field) => Self::Conflict(field),
            TaskRepositoryError::Persistence(_) => Self::Repository(err),
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Ordered task store service.
pub struct TaskService<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
}

impl<R> Clone for TaskService<R>
where
    R: TaskRepository,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R> TaskService<R>
where
    R: TaskRepository,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Lists all tasks in presentation order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repository.list().await?)
    }

    /// Validates the payload and stores a new task.
    ///
    /// An explicit `ordem_apresentacao` is honoured; otherwise the next
    /// order after the current maximum is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] for invalid fields and
    /// [`TaskServiceError::Conflict`] when the name or order is taken.
    pub async fn create(&self, payload: &TaskPayload) -> TaskServiceResult<Task> {
        let validated =
            validate_payload(payload, OrderPolicy::Accept).map_err(TaskServiceError::Validation)?;
        let new_task = validated.into_new_task();
        debug!(
            explicit_order = new_task.order.map(|order| order.value()),
            "creating task"
        );

        let created = self
            .repository
            .create(new_task)
            .await
            .map_err(log_conflict)?;
        info!(
            task_id = created.id().value(),
            order = created.order().value(),
            "task created"
        );
        Ok(created)
    }

    /// Validates the payload and replaces a task's name, cost and due date.
    ///
    /// Any `ordem_apresentacao` in the payload is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] for invalid fields,
    /// [`TaskServiceError::NotFound`] for unknown tasks, and
    /// [`TaskServiceError::Conflict`] when the name is taken.
    pub async fn update(&self, id: TaskId, payload: &TaskPayload) -> TaskServiceResult<Task> {
        let validated =
            validate_payload(payload, OrderPolicy::Ignore).map_err(TaskServiceError::Validation)?;

        let updated = self
            .repository
            .update(id, validated.into_changes())
            .await
            .map_err(log_conflict)?;
        info!(task_id = id.value(), "task updated");
        Ok(updated)
    }

    /// Deletes a task. Remaining orders are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown tasks.
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<()> {
        self.repository.delete(id).await?;
        info!(task_id = id.value(), "task deleted");
        Ok(())
    }

    /// Moves a task one position `up` or `down`.
    ///
    /// The direction is checked before storage is touched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::InvalidDirection`] for unknown tokens and
    /// [`TaskServiceError::NotFound`] for unknown tasks.
    pub async fn move_task(&self, id: TaskId, direction: &str) -> TaskServiceResult<MoveOutcome> {
        let parsed = MoveDirection::try_from(direction)?;
        let outcome = self.repository.move_task(id, parsed).await?;
        info!(
            task_id = id.value(),
            direction = parsed.as_str(),
            swapped = outcome.swapped(),
            "task moved"
        );
        Ok(outcome)
    }
}

fn log_conflict(err: TaskRepositoryError) -> TaskRepositoryError {
    if let TaskRepositoryError::UniqueViolation(field) = &err {
        warn!(field = ?field, "write rejected by unique constraint");
    }
    err
}
