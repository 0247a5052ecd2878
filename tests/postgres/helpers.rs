//! Shared test helpers for `PostgreSQL` integration tests.

pub use super::cluster::{PostgresCluster, postgres_cluster};
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use eyre::{Result, WrapErr};
use rust_decimal::Decimal;
use std::io;
use std::str::FromStr;
use tarefas::task::{
    adapters::postgres::{PostgresTaskRepository, build_pool},
    domain::{Cost, NewTask, PresentationOrder, TaskChanges, TaskName},
};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Schema applied to every test database.
pub const CREATE_TAREFAS_SQL: &str =
    include_str!("../../migrations/2026-10-18-000000_create_tarefas/up.sql");

/// Builds a multi-threaded runtime for driving repository futures.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
pub fn test_runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
}

/// A migrated, uniquely named database dropped when the value is dropped.
pub struct TestDatabase {
    cluster: PostgresCluster,
    name: String,
    url: String,
    /// Repository bound to this database.
    pub repo: PostgresTaskRepository,
}

impl TestDatabase {
    /// Creates and migrates a fresh database with a pool of `pool_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created, migrated, or
    /// pooled.
    pub fn create(cluster: PostgresCluster, pool_size: u32) -> Result<Self> {
        let name = format!("tarefas_{}", Uuid::new_v4().simple());
        cluster.create_database(&name)?;
        let url = cluster.database_url(&name);

        let mut conn = PgConnection::establish(&url).wrap_err("connect to test database")?;
        conn.batch_execute(CREATE_TAREFAS_SQL)
            .wrap_err("apply tarefas schema")?;
        let pool = build_pool(&url, pool_size).wrap_err("build test pool")?;

        Ok(Self {
            cluster,
            name,
            url,
            repo: PostgresTaskRepository::new(pool),
        })
    }
}

impl TestDatabase {
    /// Connection URL of this database.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(&self.name));
    }
}

/// Builds an order-less insert request.
///
/// # Panics
///
/// Panics when `name` is blank or `cost` is not a non-negative decimal.
#[must_use]
pub fn new_task(name: &str, cost: &str) -> NewTask {
    NewTask {
        name: TaskName::new(name).expect("valid name"),
        cost: Cost::new(Decimal::from_str(cost).expect("decimal literal")).expect("valid cost"),
        due_date: due_date(),
        order: None,
    }
}

/// Builds an insert request with an explicit order.
#[must_use]
pub fn new_task_at(name: &str, order: i32) -> NewTask {
    NewTask {
        order: Some(PresentationOrder::new(order)),
        ..new_task(name, "1.00")
    }
}

/// Builds an update request.
///
/// # Panics
///
/// Panics when `name` is blank or `cost` is not a non-negative decimal.
#[must_use]
pub fn changes(name: &str, cost: &str) -> TaskChanges {
    let task = new_task(name, cost);
    TaskChanges {
        name: task.name,
        cost: task.cost,
        due_date: task.due_date,
    }
}

/// Due date shared by the fixtures.
///
/// # Panics
///
/// Never in practice; the literal date is valid.
#[must_use]
pub fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 12, 24).expect("valid date")
}
