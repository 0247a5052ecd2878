//! `PostgreSQL` repository implementation for the ordered task collection.
//!
//! Order allocation and moves lock the whole `tarefas` table in `EXCLUSIVE`
//! mode for the length of their transaction. Plain reads are not blocked,
//! but two allocating inserts or two moves can never observe the same
//! maximum or the same neighbour concurrently.

use super::{
    models::{NewTaskRow, OrderSlotRow, TaskChangesRow, TaskRow},
    schema::tarefas,
};
use crate::task::{
    domain::{
        Cost, MoveDirection, MoveOutcome, NewTask, OrderSlot, PersistedTaskData,
        PresentationOrder, Relocation, SwapPlan, Task, TaskChanges, TaskId, TaskName, UniqueField,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for `database_url` holding at most `max_size`
/// connections.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be
/// established.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<TaskPgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Runs `f` on a pooled connection off the async executor.
    ///
    /// The connection returns to the pool when `f` finishes, whatever its
    /// outcome.
    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                Self::UniqueViolation(unique_field(info.as_ref()))
            }
            _ => Self::persistence(err),
        }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn list(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tarefas::table
                .order(tarefas::ordem_apresentacao.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let order = match task.order {
                    Some(explicit) => explicit,
                    None => allocate_order(tx)?,
                };
                let row = diesel::insert_into(tarefas::table)
                    .values(&NewTaskRow::new(&task, order))
                    .returning(TaskRow::as_returning())
                    .get_result::<TaskRow>(tx)?;
                row_to_task(row)
            })
        })
        .await
    }

    async fn update(&self, id: TaskId, changes: TaskChanges) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            let row = diesel::update(tarefas::table.find(id.value()))
                .set(&TaskChangesRow::from(&changes))
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .optional()?;
            row.map_or(Err(TaskRepositoryError::NotFound(id)), row_to_task)
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tarefas::table.find(id.value())).execute(connection)?;
            if deleted == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn move_task(
        &self,
        id: TaskId,
        direction: MoveDirection,
    ) -> TaskRepositoryResult<MoveOutcome> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                lock_collection(tx)?;
                let current = find_slot(tx, id)?.ok_or(TaskRepositoryError::NotFound(id))?;
                let Some(neighbour) = find_neighbour(tx, current, direction)? else {
                    return Ok(MoveOutcome::AtBoundary);
                };

                let plan = SwapPlan::new(current, neighbour, current_max_order(tx)?)
                    .map_err(TaskRepositoryError::persistence)?;
                debug!(
                    task_id = id.value(),
                    neighbour_id = neighbour.task_id().value(),
                    scratch = plan.scratch().value(),
                    "swapping presentation orders"
                );
                for relocation in plan.steps() {
                    apply_relocation(tx, *relocation)?;
                }
                Ok(MoveOutcome::Swapped)
            })
        })
        .await
    }
}

fn lock_collection(connection: &mut PgConnection) -> QueryResult<()> {
    diesel::sql_query("LOCK TABLE tarefas IN EXCLUSIVE MODE")
        .execute(connection)
        .map(drop)
}

fn current_max_order(connection: &mut PgConnection) -> QueryResult<Option<PresentationOrder>> {
    let max_order = tarefas::table
        .select(max(tarefas::ordem_apresentacao))
        .get_result::<Option<i32>>(connection)?;
    Ok(max_order.map(PresentationOrder::new))
}

/// Locks the collection and returns the order after the current maximum.
/// The lock is held until the surrounding transaction ends.
fn allocate_order(connection: &mut PgConnection) -> TaskRepositoryResult<PresentationOrder> {
    lock_collection(connection)?;
    let allocated = PresentationOrder::next_after(current_max_order(connection)?)
        .map_err(TaskRepositoryError::persistence)?;
    debug!(order = allocated.value(), "allocated presentation order");
    Ok(allocated)
}

fn find_slot(connection: &mut PgConnection, id: TaskId) -> QueryResult<Option<OrderSlot>> {
    let row = tarefas::table
        .find(id.value())
        .select(OrderSlotRow::as_select())
        .first::<OrderSlotRow>(connection)
        .optional()?;
    Ok(row.map(row_to_slot))
}

fn find_neighbour(
    connection: &mut PgConnection,
    current: OrderSlot,
    direction: MoveDirection,
) -> QueryResult<Option<OrderSlot>> {
    let pivot = current.order().value();
    let row = match direction {
        MoveDirection::Up => tarefas::table
            .filter(tarefas::ordem_apresentacao.lt(pivot))
            .order(tarefas::ordem_apresentacao.desc())
            .select(OrderSlotRow::as_select())
            .first::<OrderSlotRow>(connection)
            .optional()?,
        MoveDirection::Down => tarefas::table
            .filter(tarefas::ordem_apresentacao.gt(pivot))
            .order(tarefas::ordem_apresentacao.asc())
            .select(OrderSlotRow::as_select())
            .first::<OrderSlotRow>(connection)
            .optional()?,
    };
    Ok(row.map(row_to_slot))
}

fn apply_relocation(connection: &mut PgConnection, relocation: Relocation) -> QueryResult<()> {
    diesel::update(tarefas::table.find(relocation.task_id().value()))
        .set(tarefas::ordem_apresentacao.eq(relocation.target().value()))
        .execute(connection)
        .map(drop)
}

const fn row_to_slot(row: OrderSlotRow) -> OrderSlot {
    OrderSlot::new(
        TaskId::new(row.id),
        PresentationOrder::new(row.ordem_apresentacao),
    )
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        nome,
        custo,
        data_limite,
        ordem_apresentacao,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::new(id),
        name: TaskName::new(nome).map_err(TaskRepositoryError::persistence)?,
        cost: Cost::new(custo).map_err(TaskRepositoryError::persistence)?,
        due_date: data_limite,
        order: PresentationOrder::new(ordem_apresentacao),
    };
    Ok(Task::from_persisted(data))
}

fn unique_field(info: &dyn DatabaseErrorInformation) -> UniqueField {
    let detail = info.details().map_or_else(
        || info.message().to_owned(),
        |details| format!("{} {details}", info.message()),
    );
    UniqueField::from_violation(info.constraint_name(), &detail)
}
