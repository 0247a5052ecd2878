//! In-memory adapters for tests and database-free runs.

mod task;

pub use task::InMemoryTaskRepository;
