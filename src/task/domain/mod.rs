//! Domain model for the ordered task collection.
//!
//! The domain owns payload validation, presentation order allocation, the
//! three-step swap protocol, and the translation of uniqueness violations,
//! while keeping all infrastructure concerns outside of the domain boundary.

mod conflict;
mod error;
mod ids;
mod order;
mod task;
mod validation;

pub use conflict::{NAME_CONSTRAINT, ORDER_CONSTRAINT, UniqueField};
pub use error::{ParseMoveDirectionError, TaskDomainError};
pub use ids::TaskId;
pub use order::{MoveDirection, MoveOutcome, OrderSlot, PresentationOrder, Relocation, SwapPlan};
pub use task::{Cost, NewTask, PersistedTaskData, Task, TaskChanges, TaskName};
pub use validation::{
    COST_FIELD, DUE_DATE_FIELD, FieldErrors, NAME_FIELD, ORDER_FIELD, OrderPolicy, TaskPayload,
    ValidatedTask, validate_payload,
};
