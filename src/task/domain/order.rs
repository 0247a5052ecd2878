//! Presentation order values, order allocation, and the swap protocol used
//! by move operations.
//!
//! The order column carries an immediately checked unique constraint, so two
//! rows can never exchange values with a pair of direct updates. [`SwapPlan`]
//! breaks the exchange into three relocations through a scratch value that
//! sits above every existing order.

use super::{ParseMoveDirectionError, TaskDomainError, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a task in the single total display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresentationOrder(i32);

impl PresentationOrder {
    /// Order assigned to the first task of an empty collection.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw order value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns the order that extends the current maximum.
    ///
    /// An empty collection (`None`) yields [`Self::FIRST`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OrderSpaceExhausted`] when the maximum is
    /// already `i32::MAX`.
    pub const fn next_after(max: Option<Self>) -> Result<Self, TaskDomainError> {
        match max {
            None => Ok(Self::FIRST),
            Some(current) => match current.0.checked_add(1) {
                Some(next) => Ok(Self(next)),
                None => Err(TaskDomainError::OrderSpaceExhausted),
            },
        }
    }

    /// Allocates the next order for a collection holding `existing` orders.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OrderSpaceExhausted`] when the maximum
    /// existing order cannot be extended.
    pub fn allocate<I>(existing: I) -> Result<Self, TaskDomainError>
    where
        I: IntoIterator<Item = Self>,
    {
        Self::next_after(existing.into_iter().max())
    }
}

impl fmt::Display for PresentationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a move relative to the display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Toward lower order values.
    Up,
    /// Toward higher order values.
    Down,
}

impl MoveDirection {
    /// Returns the wire token for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Picks the immediate neighbour of `current` among `candidates`.
    ///
    /// `Up` selects the greatest order strictly below the current one and
    /// `Down` the least order strictly above it.
    #[must_use]
    pub fn neighbour<I>(self, current: OrderSlot, candidates: I) -> Option<OrderSlot>
    where
        I: IntoIterator<Item = OrderSlot>,
    {
        let pivot = current.order();
        let slots = candidates.into_iter();
        match self {
            Self::Up => slots
                .filter(|slot| slot.order() < pivot)
                .max_by_key(|slot| slot.order()),
            Self::Down => slots
                .filter(|slot| slot.order() > pivot)
                .min_by_key(|slot| slot.order()),
        }
    }
}

impl TryFrom<&str> for MoveDirection {
    type Error = ParseMoveDirectionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ParseMoveDirectionError(value.to_owned())),
        }
    }
}

/// A task identifier paired with the order it currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderSlot {
    task_id: TaskId,
    order: PresentationOrder,
}

impl OrderSlot {
    /// Creates a slot.
    #[must_use]
    pub const fn new(task_id: TaskId, order: PresentationOrder) -> Self {
        Self { task_id, order }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(self) -> TaskId {
        self.task_id
    }

    /// Returns the order held by the task.
    #[must_use]
    pub const fn order(self) -> PresentationOrder {
        self.order
    }
}

/// Result of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    /// The task exchanged orders with its neighbour.
    Swapped,
    /// The task already sat at the boundary; nothing changed.
    AtBoundary,
}

impl MoveOutcome {
    /// Returns `true` when orders were exchanged.
    #[must_use]
    pub const fn swapped(self) -> bool {
        matches!(self, Self::Swapped)
    }
}

/// A single order update applied to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relocation {
    task_id: TaskId,
    target: PresentationOrder,
}

impl Relocation {
    /// Returns the task being moved.
    #[must_use]
    pub const fn task_id(self) -> TaskId {
        self.task_id
    }

    /// Returns the order the task is moved to.
    #[must_use]
    pub const fn target(self) -> PresentationOrder {
        self.target
    }
}

/// Three-step exchange of two tasks' orders through a scratch value.
///
/// Applying the steps in sequence never leaves two rows sharing an order:
///
/// 1. `current` moves to the scratch value (above every existing order).
/// 2. `neighbour` moves into the order `current` vacated.
/// 3. `current` moves from the scratch value into the order `neighbour`
///    vacated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    steps: [Relocation; 3],
    scratch: PresentationOrder,
}

impl SwapPlan {
    /// Plans the exchange of `current` and `neighbour`.
    ///
    /// `max_existing` is the greatest order currently stored; the scratch
    /// value is one above it (or above both slots, whichever is higher).
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OrderSpaceExhausted`] when no scratch value
    /// exists above the current maximum.
    pub fn new(
        current: OrderSlot,
        neighbour: OrderSlot,
        max_existing: Option<PresentationOrder>,
    ) -> Result<Self, TaskDomainError> {
        let ceiling = [Some(current.order()), Some(neighbour.order()), max_existing]
            .into_iter()
            .flatten()
            .max();
        let scratch = PresentationOrder::next_after(ceiling)?;

        let steps = [
            Relocation {
                task_id: current.task_id(),
                target: scratch,
            },
            Relocation {
                task_id: neighbour.task_id(),
                target: current.order(),
            },
            Relocation {
                task_id: current.task_id(),
                target: neighbour.order(),
            },
        ];
        Ok(Self { steps, scratch })
    }

    /// Returns the relocations in the order they must be applied.
    #[must_use]
    pub const fn steps(&self) -> &[Relocation] {
        &self.steps
    }

    /// Returns the temporary order used by the first step.
    #[must_use]
    pub const fn scratch(&self) -> PresentationOrder {
        self.scratch
    }
}
