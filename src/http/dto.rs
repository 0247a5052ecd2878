//! JSON bodies returned by the API.

use crate::task::domain::{FieldErrors, Task};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A stored task as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResponse {
    /// Storage identifier.
    pub id: i64,
    /// Task name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Cost, rendered as a JSON number.
    #[serde(rename = "custo", with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    /// Due date as `YYYY-MM-DD`.
    #[serde(rename = "data_limite")]
    pub due_date: NaiveDate,
    /// Presentation order.
    #[serde(rename = "ordem_apresentacao")]
    pub order: i32,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().value(),
            name: task.name().as_str().to_owned(),
            cost: task.cost().amount(),
            due_date: task.due_date(),
            order: task.order().value(),
        }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Always `true` while the process serves requests.
    pub ok: bool,
}

/// Acknowledgement for mutations without a resource body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
}

/// Outcome of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveResponse {
    /// Always `true` for a handled move.
    pub success: bool,
    /// `false` when the task was already at the boundary.
    pub swapped: bool,
}

/// Single-message error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// User-facing message.
    pub error: &'static str,
}

/// Field-keyed validation error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorResponse {
    /// Message per failing field.
    pub errors: FieldErrors,
}
