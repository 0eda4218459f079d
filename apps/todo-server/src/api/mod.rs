//! API endpoints.

pub mod todo;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use todo_store::TodoStore;

use crate::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router<S: TodoStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Todo endpoints
        .route("/todo", get(todo::list_todos).post(todo::create_todo))
        .route("/todo/", get(todo::list_todos).post(todo::create_todo))
        .route(
            "/todo/:todo_id",
            get(todo::get_todo)
                .put(todo::update_todo)
                .delete(todo::delete_todo),
        )
        // Health checks
        .route("/", get(api_health))
        .route("/health", get(health_check))
}

/// Root health endpoint.
async fn api_health() -> Json<Value> {
    Json(json!({
        "status": 200,
        "message": "API is Healthy",
    }))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
