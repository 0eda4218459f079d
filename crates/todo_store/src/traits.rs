//! Todo store trait definitions.

use async_trait::async_trait;
use entities::{Todo, TodoCreate, TodoUpdate};

use crate::TodoStoreResult;

/// Default page size for listing todos.
pub const DEFAULT_LIMIT: u32 = 100;

/// Offset/limit window for listing todos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoFilter {
    /// Number of todos to skip.
    pub skip: u32,
    /// Maximum number of results.
    pub limit: u32,
}

impl Default for TodoFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TodoFilter {
    /// Creates a filter for the given window.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }
}

/// Trait for todo storage operations.
///
/// Implementations own their connection provider and run each call in one
/// scoped transaction. A failed write is rolled back before the error is
/// returned, so the store is left exactly as it was before the call.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Gets a live todo by ID.
    ///
    /// Returns `TodoStoreError::NotFound` if no such todo exists.
    async fn get_todo(&self, id: i64) -> TodoStoreResult<Todo>;

    /// Lists todos in insertion order within the given window.
    ///
    /// An empty store or a window past the end yields an empty vector.
    async fn list_todos(&self, filter: TodoFilter) -> TodoStoreResult<Vec<Todo>>;

    /// Creates a new todo with `completed = false` and a store-assigned ID.
    async fn create_todo(&self, todo: TodoCreate) -> TodoStoreResult<Todo>;

    /// Applies the fields present in `update` to the todo with the given ID.
    async fn update_todo(&self, id: i64, update: TodoUpdate) -> TodoStoreResult<Todo>;

    /// Deletes a todo. Deleting an absent todo returns `NotFound`.
    async fn delete_todo(&self, id: i64) -> TodoStoreResult<()>;
}
