//! `PostgreSQL` adapters for the ordered task collection.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool, build_pool};
