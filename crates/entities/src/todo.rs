//! Todo entity definitions.

use serde::{Deserialize, Serialize};

/// A single task with a title, a description and a completion flag.
///
/// This is both the persisted record and the read representation returned
/// to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identifier. Never reused.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Whether the task is done.
    pub completed: bool,
}

/// Read representation of a persisted todo.
pub type TodoInDb = Todo;

impl Todo {
    /// Creates a new, not yet completed todo with the given store-assigned ID.
    pub fn new(id: i64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }
}
