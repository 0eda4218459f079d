//! Todo Server
//!
//! A small REST service for creating, reading, updating and deleting todos.
//! Requests are validated by the extractors in [`api`], handed to a
//! [`TodoStore`] and mapped back to HTTP through [`error::ServerError`].

pub mod api;
pub mod config;
pub mod error;
pub mod state;

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    response::{IntoResponse, Response},
};
use todo_store::{SqliteTodoStore, TodoStore, TodoStoreResult};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as CorsAny, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::error::ServerError;
use crate::state::{AppState, create_shared_state};

/// Creates the application router with all routes configured.
pub fn create_app<S: TodoStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny);

    api::create_router()
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
}

/// Converts a handler panic into the opaque internal error response.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ServerError::Internal(detail).into_response()
}

/// Creates the application state around the given store.
pub fn create_state<S: TodoStore>(store: S) -> Arc<AppState<S>> {
    create_shared_state(store)
}

/// Connects to the configured database and makes sure the table exists.
pub async fn connect_store(config: &Config) -> TodoStoreResult<SqliteTodoStore> {
    let store = SqliteTodoStore::connect(&config.database_url, config.max_connections).await?;
    store.init().await?;

    tracing::info!(database_url = %config.database_url, "Database tables created");

    Ok(store)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
