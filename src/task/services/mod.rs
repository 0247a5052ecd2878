//! Application services for the ordered task collection.

mod store;

pub use store::{TaskService, TaskServiceError, TaskServiceResult};
