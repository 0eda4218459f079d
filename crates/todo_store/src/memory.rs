//! In-memory todo store implementation for testing.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use entities::{Todo, TodoCreate, TodoUpdate};
use tokio::sync::RwLock;

use crate::{TodoFilter, TodoStore, TodoStoreError, TodoStoreResult};

#[derive(Debug, Default)]
struct MemoryTodos {
    todos: BTreeMap<i64, Todo>,
    last_id: i64,
}

/// In-memory todo store for testing purposes.
///
/// IDs are handed out from a counter that only grows, so a deleted ID is
/// never reused.
#[derive(Debug, Default, Clone)]
pub struct MemoryTodoStore {
    inner: Arc<RwLock<MemoryTodos>>,
}

impl MemoryTodoStore {
    /// Creates a new in-memory todo store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn get_todo(&self, id: i64) -> TodoStoreResult<Todo> {
        let inner = self.inner.read().await;
        inner
            .todos
            .get(&id)
            .cloned()
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))
    }

    async fn list_todos(&self, filter: TodoFilter) -> TodoStoreResult<Vec<Todo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .todos
            .values()
            .skip(filter.skip as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_todo(&self, todo: TodoCreate) -> TodoStoreResult<Todo> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let todo = Todo::new(inner.last_id, todo.title, todo.description);
        inner.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update_todo(&self, id: i64, update: TodoUpdate) -> TodoStoreResult<Todo> {
        let mut inner = self.inner.write().await;
        let todo = inner
            .todos
            .get_mut(&id)
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))?;
        update.apply(todo);
        Ok(todo.clone())
    }

    async fn delete_todo(&self, id: i64) -> TodoStoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.todos.remove(&id).is_none() {
            return Err(TodoStoreError::not_found("Todo", id));
        }
        Ok(())
    }
}
