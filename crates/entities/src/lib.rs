//! Core entity definitions for the Todo service.
//!
//! This crate defines the persisted `Todo` record and the request shapes
//! used to create and update it. It carries no storage or transport
//! dependencies.

mod schema;
mod todo;

pub use schema::*;
pub use todo::*;
