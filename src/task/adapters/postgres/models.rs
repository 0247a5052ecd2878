//! Diesel row models for task persistence.

use super::schema::tarefas;
use crate::task::domain::{NewTask, PresentationOrder, TaskChanges};
use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tarefas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Task name.
    pub nome: String,
    /// Task cost.
    pub custo: Decimal,
    /// Due date.
    pub data_limite: NaiveDate,
    /// Presentation order.
    pub ordem_apresentacao: i32,
}

/// Identifier and order of a task, read while planning a move.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = tarefas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderSlotRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Presentation order.
    pub ordem_apresentacao: i32,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tarefas)]
pub struct NewTaskRow<'a> {
    /// Task name.
    pub nome: &'a str,
    /// Task cost.
    pub custo: Decimal,
    /// Due date.
    pub data_limite: NaiveDate,
    /// Presentation order, explicit or freshly allocated.
    pub ordem_apresentacao: i32,
}

impl<'a> NewTaskRow<'a> {
    /// Builds the insert row for `task` at `order`.
    #[must_use]
    pub fn new(task: &'a NewTask, order: PresentationOrder) -> Self {
        Self {
            nome: task.name.as_str(),
            custo: task.cost.amount(),
            data_limite: task.due_date,
            ordem_apresentacao: order.value(),
        }
    }
}

/// Changeset for the editable task columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tarefas)]
pub struct TaskChangesRow<'a> {
    /// Replacement name.
    pub nome: &'a str,
    /// Replacement cost.
    pub custo: Decimal,
    /// Replacement due date.
    pub data_limite: NaiveDate,
}

impl<'a> From<&'a TaskChanges> for TaskChangesRow<'a> {
    fn from(changes: &'a TaskChanges) -> Self {
        Self {
            nome: changes.name.as_str(),
            custo: changes.cost.amount(),
            data_limite: changes.due_date,
        }
    }
}
