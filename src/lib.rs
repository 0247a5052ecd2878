//! Tarefas: an ordered task store served over HTTP.
//!
//! Tasks carry a name, a cost, a due date and a unique presentation order.
//! The store keeps that order consistent under concurrent requests: new
//! tasks extend the maximum order, moves exchange orders with the adjacent
//! task, and deletions never renumber what remains.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Validation and ordering rules with no infrastructure
//!   dependencies
//! - **Ports**: The repository trait the service depends on
//! - **Adapters**: `PostgreSQL` and in-memory repositories
//!
//! # Modules
//!
//! - [`task`]: The ordered task collection
//! - [`http`]: Axum router, handlers and error mapping
//! - [`config`]: Environment configuration

pub mod config;
pub mod http;
pub mod task;
