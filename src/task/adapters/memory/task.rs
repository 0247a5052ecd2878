//! In-memory repository for the ordered task collection.
//!
//! Mirrors the storage contract of the `PostgreSQL` adapter: names and
//! orders are unique and checked after every single write, mutations run
//! against a working copy that only replaces the committed state on
//! success, and the state lock serializes writers the way the table lock
//! does.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        MoveDirection, MoveOutcome, NAME_CONSTRAINT, NewTask, ORDER_CONSTRAINT, OrderSlot,
        PersistedTaskData, PresentationOrder, SwapPlan, Task, TaskChanges, TaskId, TaskName,
        UniqueField,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: BTreeMap<TaskId, Task>,
    last_id: i64,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn violation(constraint: &str) -> TaskRepositoryError {
    TaskRepositoryError::UniqueViolation(UniqueField::from_violation(Some(constraint), ""))
}

fn ensure_name_free(
    tasks: &BTreeMap<TaskId, Task>,
    name: &TaskName,
    except: Option<TaskId>,
) -> TaskRepositoryResult<()> {
    let taken = tasks
        .values()
        .any(|task| Some(task.id()) != except && task.name() == name);
    if taken {
        return Err(violation(NAME_CONSTRAINT));
    }
    Ok(())
}

fn ensure_order_free(
    tasks: &BTreeMap<TaskId, Task>,
    order: PresentationOrder,
    except: Option<TaskId>,
) -> TaskRepositoryResult<()> {
    let taken = tasks
        .values()
        .any(|task| Some(task.id()) != except && task.order() == order);
    if taken {
        return Err(violation(ORDER_CONSTRAINT));
    }
    Ok(())
}

fn slots(tasks: &BTreeMap<TaskId, Task>) -> impl Iterator<Item = OrderSlot> + '_ {
    tasks
        .values()
        .map(|task| OrderSlot::new(task.id(), task.order()))
}

/// Applies one order update, enforcing uniqueness immediately.
fn relocate(
    tasks: &mut BTreeMap<TaskId, Task>,
    task_id: TaskId,
    target: PresentationOrder,
) -> TaskRepositoryResult<()> {
    ensure_order_free(tasks, target, Some(task_id))?;
    let task = tasks
        .get_mut(&task_id)
        .ok_or(TaskRepositoryError::NotFound(task_id))?;
    task.relocate(target);
    Ok(())
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list(&self) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(Task::order);
        Ok(tasks)
    }

    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let order = match task.order {
            Some(explicit) => explicit,
            None => PresentationOrder::allocate(state.tasks.values().map(Task::order))
                .map_err(TaskRepositoryError::persistence)?,
        };
        ensure_name_free(&state.tasks, &task.name, None)?;
        ensure_order_free(&state.tasks, order, None)?;

        let id = TaskId::new(state.last_id + 1);
        let created = Task::from_persisted(PersistedTaskData {
            id,
            name: task.name,
            cost: task.cost,
            due_date: task.due_date,
            order,
        });
        state.last_id = id.value();
        state.tasks.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: TaskId, changes: TaskChanges) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&id) {
            return Err(TaskRepositoryError::NotFound(id));
        }
        ensure_name_free(&state.tasks, &changes.name, Some(id))?;

        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        task.apply_changes(changes);
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .tasks
            .remove(&id)
            .map(drop)
            .ok_or(TaskRepositoryError::NotFound(id))
    }

    async fn move_task(
        &self,
        id: TaskId,
        direction: MoveDirection,
    ) -> TaskRepositoryResult<MoveOutcome> {
        let mut state = self.write()?;
        let current = state
            .tasks
            .get(&id)
            .map(|task| OrderSlot::new(task.id(), task.order()))
            .ok_or(TaskRepositoryError::NotFound(id))?;
        let Some(neighbour) = direction.neighbour(current, slots(&state.tasks)) else {
            return Ok(MoveOutcome::AtBoundary);
        };

        let max_order = state.tasks.values().map(Task::order).max();
        let plan = SwapPlan::new(current, neighbour, max_order)
            .map_err(TaskRepositoryError::persistence)?;

        let mut working = state.tasks.clone();
        for relocation in plan.steps() {
            relocate(&mut working, relocation.task_id(), relocation.target())?;
        }
        state.tasks = working;
        Ok(MoveOutcome::Swapped)
    }
}
