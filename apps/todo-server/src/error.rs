//! Server error types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use todo_store::TodoStoreError;

/// Error codes carried in the `error.code` field of failure responses.
pub mod error_codes {
    /// The request body, path or query failed validation.
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    /// The referenced todo does not exist.
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// The store rejected the operation.
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    /// Any other failure.
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

const DATABASE_ERROR_MESSAGE: &str =
    "An error occurred while processing your request with the database.";
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(TodoStoreError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TodoStoreError> for ServerError {
    fn from(err: TodoStoreError) -> Self {
        match err {
            TodoStoreError::NotFound { entity_type, .. } => {
                ServerError::NotFound(format!("{entity_type} not found"))
            }
            other => ServerError::Database(other),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

impl ServerError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Database(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match &self {
            ServerError::Validation(msg) => (error_codes::VALIDATION_ERROR, msg.clone()),
            ServerError::NotFound(msg) => (error_codes::NOT_FOUND, msg.clone()),
            ServerError::Database(e) => {
                tracing::error!(error = %e, "Database error while handling request");
                (error_codes::DATABASE_ERROR, DATABASE_ERROR_MESSAGE.to_string())
            }
            ServerError::Internal(msg) => {
                tracing::error!(error = %msg, "Unhandled error while handling request");
                (error_codes::INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: ServerError = TodoStoreError::not_found("Todo", 1).into();
        assert!(matches!(err, ServerError::NotFound(ref msg) if msg == "Todo not found"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_persistence_maps_to_400() {
        let err: ServerError = TodoStoreError::Persistence(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, ServerError::Database(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_maps_to_500() {
        let err = ServerError::Internal("boom".to_string());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
