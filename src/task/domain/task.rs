//! Task aggregate and its validated field types.

use super::{PresentationOrder, TaskDomainError, TaskId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task name, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] when the value is blank
    /// after trimming.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TaskDomainError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTaskName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative task cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost(Decimal);

impl Cost {
    /// Creates a validated cost.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NegativeCost`] when the amount is below
    /// zero. Negative zero is accepted.
    pub fn new(amount: Decimal) -> Result<Self, TaskDomainError> {
        if amount < Decimal::ZERO {
            return Err(TaskDomainError::NegativeCost);
        }
        Ok(Self(amount))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

/// Fields for a task that has not been stored yet.
///
/// `order` is `None` when the storage layer must allocate the next order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task name.
    pub name: TaskName,
    /// Task cost.
    pub cost: Cost,
    /// Task due date.
    pub due_date: NaiveDate,
    /// Caller-supplied order, if any.
    pub order: Option<PresentationOrder>,
}

/// Editable fields of an existing task. The order is deliberately absent:
/// it only changes through move operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    /// Replacement name.
    pub name: TaskName,
    /// Replacement cost.
    pub cost: Cost,
    /// Replacement due date.
    pub due_date: NaiveDate,
}

/// Parameter object for reconstructing a stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Stored identifier.
    pub id: TaskId,
    /// Stored name.
    pub name: TaskName,
    /// Stored cost.
    pub cost: Cost,
    /// Stored due date.
    pub due_date: NaiveDate,
    /// Stored presentation order.
    pub order: PresentationOrder,
}

/// Task aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    cost: Cost,
    due_date: NaiveDate,
    order: PresentationOrder,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            cost: data.cost,
            due_date: data.due_date,
            order: data.order,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the task cost.
    #[must_use]
    pub const fn cost(&self) -> Cost {
        self.cost
    }

    /// Returns the task due date.
    #[must_use]
    pub const fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Returns the presentation order.
    #[must_use]
    pub const fn order(&self) -> PresentationOrder {
        self.order
    }

    /// Replaces the editable fields, keeping identifier and order.
    pub(crate) fn apply_changes(&mut self, changes: TaskChanges) {
        self.name = changes.name;
        self.cost = changes.cost;
        self.due_date = changes.due_date;
    }

    /// Moves the task to another order value.
    pub(crate) const fn relocate(&mut self, order: PresentationOrder) {
        self.order = order;
    }
}
