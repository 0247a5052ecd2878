//! Ordered task collection.
//!
//! Tasks carry a unique presentation order that defines the single display
//! ordering. New tasks extend the maximum order unless the caller chooses
//! one, moves exchange orders with the adjacent task through a collision-free
//! three-step swap, and deletions never renumber the remaining tasks. The
//! module follows hexagonal architecture:
//!
//! - Domain types, validation and ordering rules in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
