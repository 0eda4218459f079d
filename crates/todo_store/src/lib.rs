//! Todo storage and CRUD access layer.
//!
//! This crate provides the `TodoStore` abstraction and its implementations:
//! SQLite (via sqlx) for the running service and an in-memory store for
//! tests. Every operation runs in its own scoped transaction and returns a
//! typed `TodoStoreError` instead of unwinding.

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
