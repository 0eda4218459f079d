//! Todo API endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use entities::{TodoCreate, TodoInDb, TodoUpdate};
use serde::{Deserialize, Serialize};
use todo_store::{DEFAULT_LIMIT, TodoFilter, TodoStore};

use crate::error::ServerResult;
use crate::state::AppState;

/// Query parameters for listing todos.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListTodosQuery {
    /// Number of todos to skip.
    #[serde(default)]
    pub skip: u32,
    /// Maximum number of todos to return.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl From<ListTodosQuery> for TodoFilter {
    fn from(query: ListTodosQuery) -> Self {
        TodoFilter::new(query.skip, query.limit)
    }
}

/// Response body for a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTodoResponse {
    /// Human readable status message.
    pub detail: String,
}

/// Creates a todo.
pub async fn create_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<TodoCreate>, JsonRejection>,
) -> ServerResult<Json<TodoInDb>> {
    let Json(request) = payload?;

    let todo = state.store.create_todo(request).await?;

    Ok(Json(todo))
}

/// Gets a todo by ID.
pub async fn get_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    todo_id: Result<Path<i64>, PathRejection>,
) -> ServerResult<Json<TodoInDb>> {
    let Path(todo_id) = todo_id?;

    let todo = state.store.get_todo(todo_id).await?;

    Ok(Json(todo))
}

/// Lists todos.
pub async fn list_todos<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ListTodosQuery>, QueryRejection>,
) -> ServerResult<Json<Vec<TodoInDb>>> {
    let Query(query) = query?;

    let todos = state.store.list_todos(query.into()).await?;

    Ok(Json(todos))
}

/// Updates a todo with the fields present in the body.
pub async fn update_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    todo_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TodoUpdate>, JsonRejection>,
) -> ServerResult<Json<TodoInDb>> {
    let Path(todo_id) = todo_id?;
    let Json(update) = payload?;

    let todo = state.store.update_todo(todo_id, update).await?;

    Ok(Json(todo))
}

/// Deletes a todo.
pub async fn delete_todo<S: TodoStore>(
    State(state): State<Arc<AppState<S>>>,
    todo_id: Result<Path<i64>, PathRejection>,
) -> ServerResult<Json<DeleteTodoResponse>> {
    let Path(todo_id) = todo_id?;

    state.store.delete_todo(todo_id).await?;

    Ok(Json(DeleteTodoResponse {
        detail: "Todo deleted successfully".to_string(),
    }))
}
