//! SQLite todo store backed by an sqlx connection pool.

use async_trait::async_trait;
use entities::{Todo, TodoCreate, TodoUpdate};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite, SqliteConnection, Transaction};

use crate::{TodoFilter, TodoStore, TodoStoreError, TodoStoreResult};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0
)
"#;

type TodoRow = (i64, String, String, bool);

fn row_to_todo((id, title, description, completed): TodoRow) -> Todo {
    Todo {
        id,
        title,
        description,
        completed,
    }
}

/// SQLite todo store.
///
/// The pool is the connection provider: it is built once at startup and
/// handed in, and every operation checks out one connection or transaction
/// for its own duration only.
#[derive(Clone)]
pub struct SqliteTodoStore {
    pool: Pool<Sqlite>,
}

impl SqliteTodoStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> TodoStoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database with its table created.
    ///
    /// Every connection to `sqlite::memory:` sees its own database, so the
    /// pool is pinned to a single connection that never expires.
    pub async fn connect_in_memory() -> TodoStoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Creates the todos table if it does not exist yet.
    pub async fn init(&self) -> TodoStoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

async fn fetch_todo(conn: &mut SqliteConnection, id: i64) -> Result<Option<Todo>, sqlx::Error> {
    let row: Option<TodoRow> = sqlx::query_as(
        r#"
        SELECT id, title, description, completed
        FROM todos
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(row_to_todo))
}

async fn insert_todo(conn: &mut SqliteConnection, todo: &TodoCreate) -> Result<Todo, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO todos (title, description, completed)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(false)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    fetch_todo(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

async fn patch_todo(
    conn: &mut SqliteConnection,
    id: i64,
    update: TodoUpdate,
) -> Result<Option<Todo>, sqlx::Error> {
    // Write first so the transaction takes the write lock up front instead of
    // upgrading from a read lock, which SQLite refuses under contention.
    let result = sqlx::query(
        r#"
        UPDATE todos
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            completed = COALESCE(?, completed)
        WHERE id = ?
        "#,
    )
    .bind(update.title)
    .bind(update.description)
    .bind(update.completed)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    fetch_todo(conn, id).await
}

async fn remove_todo(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Rolls back `tx` after `err` and turns the cause into a persistence error.
async fn rollback(
    tx: Transaction<'_, Sqlite>,
    operation: &'static str,
    err: sqlx::Error,
) -> TodoStoreError {
    tracing::error!(error = %err, operation, "Todo write failed, rolling back");
    if let Err(rollback_err) = tx.rollback().await {
        tracing::warn!(error = %rollback_err, operation, "Rollback failed");
    }
    TodoStoreError::Persistence(err)
}

async fn commit(tx: Transaction<'_, Sqlite>, operation: &'static str) -> TodoStoreResult<()> {
    tx.commit().await.map_err(|err| {
        tracing::error!(error = %err, operation, "Todo commit failed");
        TodoStoreError::Persistence(err)
    })
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn get_todo(&self, id: i64) -> TodoStoreResult<Todo> {
        let mut conn = self.pool.acquire().await?;
        fetch_todo(&mut conn, id)
            .await?
            .ok_or_else(|| TodoStoreError::not_found("Todo", id))
    }

    async fn list_todos(&self, filter: TodoFilter) -> TodoStoreResult<Vec<Todo>> {
        let rows: Vec<TodoRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, completed
            FROM todos
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(filter.limit))
        .bind(i64::from(filter.skip))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_todo).collect())
    }

    async fn create_todo(&self, todo: TodoCreate) -> TodoStoreResult<Todo> {
        let mut tx = self.pool.begin().await?;

        let result = insert_todo(&mut tx, &todo).await;
        match result {
            Ok(created) => {
                commit(tx, "create").await?;
                tracing::info!(todo_id = created.id, "Todo created");
                Ok(created)
            }
            Err(err) => Err(rollback(tx, "create", err).await),
        }
    }

    async fn update_todo(&self, id: i64, update: TodoUpdate) -> TodoStoreResult<Todo> {
        let mut tx = self.pool.begin().await?;

        let result = patch_todo(&mut tx, id, update).await;
        match result {
            Ok(Some(updated)) => {
                commit(tx, "update").await?;
                tracing::info!(todo_id = id, "Todo updated");
                Ok(updated)
            }
            // Nothing was written; dropping the transaction releases it.
            Ok(None) => Err(TodoStoreError::not_found("Todo", id)),
            Err(err) => Err(rollback(tx, "update", err).await),
        }
    }

    async fn delete_todo(&self, id: i64) -> TodoStoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = remove_todo(&mut tx, id).await;
        match result {
            Ok(true) => {
                commit(tx, "delete").await?;
                tracing::info!(todo_id = id, "Todo deleted");
                Ok(())
            }
            Ok(false) => Err(TodoStoreError::not_found("Todo", id)),
            Err(err) => Err(rollback(tx, "delete", err).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteTodoStore {
        SqliteTodoStore::connect_in_memory().await.unwrap()
    }

    async fn count(store: &SqliteTodoStore) -> usize {
        store
            .list_todos(TodoFilter::new(0, u32::MAX))
            .await
            .unwrap()
            .len()
    }

    async fn install_failing_trigger(store: &SqliteTodoStore, event: &str) {
        let sql = format!(
            "CREATE TRIGGER fail_{event} BEFORE {event} ON todos \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END"
        );
        sqlx::query(&sql).execute(store.pool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = test_store().await;

        let created = store
            .create_todo(TodoCreate::new("Buy milk", "2%"))
            .await
            .unwrap();
        assert_eq!(created, Todo::new(1, "Buy milk", "2%"));

        let fetched = store.get_todo(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert!(!fetched.completed);
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let store = test_store().await;
        store.create_todo(TodoCreate::new("a", "b")).await.unwrap();

        store.init().await.unwrap();

        assert_eq!(count(&store).await, 1);
    }

    #[tokio::test]
    async fn test_missing_todo_is_not_found() {
        let store = test_store().await;

        assert!(store.get_todo(1).await.unwrap_err().is_not_found());
        assert!(store
            .update_todo(1, TodoUpdate::default().with_completed(true))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.delete_todo(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let store = test_store().await;
        let todo = store.create_todo(TodoCreate::new("a", "b")).await.unwrap();

        store.delete_todo(todo.id).await.unwrap();

        assert!(store.delete_todo(todo.id).await.unwrap_err().is_not_found());
        assert!(store.get_todo(todo.id).await.unwrap_err().is_not_found());
        assert!(store
            .update_todo(todo.id, TodoUpdate::default().with_title("c"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_partial_update_changes_only_given_fields() {
        let store = test_store().await;
        let todo = store
            .create_todo(TodoCreate::new("Buy milk", "2%"))
            .await
            .unwrap();

        let updated = store
            .update_todo(todo.id, TodoUpdate::default().with_completed(true))
            .await
            .unwrap();
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, "2%");
        assert!(updated.completed);

        let updated = store
            .update_todo(todo.id, TodoUpdate::default().with_description("skimmed"))
            .await
            .unwrap();
        assert_eq!(updated.description, "skimmed");
        assert!(updated.completed);

        assert_eq!(store.get_todo(todo.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_empty_update_returns_unchanged_todo() {
        let store = test_store().await;
        let todo = store.create_todo(TodoCreate::new("a", "b")).await.unwrap();

        let updated = store
            .update_todo(todo.id, TodoUpdate::default())
            .await
            .unwrap();

        assert_eq!(updated, todo);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let store = test_store().await;

        let todos = store.list_todos(TodoFilter::default()).await.unwrap();

        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn test_list_window_in_insertion_order() {
        let store = test_store().await;
        for i in 0..5 {
            store
                .create_todo(TodoCreate::new(format!("todo {i}"), "desc"))
                .await
                .unwrap();
        }

        let page = store.list_todos(TodoFilter::new(1, 3)).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["todo 1", "todo 2", "todo 3"]);

        assert!(store.list_todos(TodoFilter::new(0, 0)).await.unwrap().is_empty());
        assert!(store.list_todos(TodoFilter::new(5, 10)).await.unwrap().is_empty());
        assert_eq!(count(&store).await, 5);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let store = test_store().await;
        let first = store.create_todo(TodoCreate::new("a", "b")).await.unwrap();
        let second = store.create_todo(TodoCreate::new("c", "d")).await.unwrap();
        store.delete_todo(second.id).await.unwrap();

        let third = store.create_todo(TodoCreate::new("e", "f")).await.unwrap();

        assert!(second.id > first.id);
        assert!(third.id > second.id);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_row() {
        let store = test_store().await;
        store.create_todo(TodoCreate::new("a", "b")).await.unwrap();
        install_failing_trigger(&store, "INSERT").await;

        let err = store
            .create_todo(TodoCreate::new("c", "d"))
            .await
            .unwrap_err();

        assert!(matches!(err, TodoStoreError::Persistence(_)));
        assert_eq!(count(&store).await, 1);
    }

    #[tokio::test]
    async fn test_failed_update_preserves_prior_state() {
        let store = test_store().await;
        let todo = store
            .create_todo(TodoCreate::new("Buy milk", "2%"))
            .await
            .unwrap();
        install_failing_trigger(&store, "UPDATE").await;

        let err = store
            .update_todo(
                todo.id,
                TodoUpdate::default()
                    .with_title("Buy bread")
                    .with_completed(true),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TodoStoreError::Persistence(_)));
        assert_eq!(store.get_todo(todo.id).await.unwrap(), todo);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_todo() {
        let store = test_store().await;
        let todo = store.create_todo(TodoCreate::new("a", "b")).await.unwrap();
        install_failing_trigger(&store, "DELETE").await;

        let err = store.delete_todo(todo.id).await.unwrap_err();

        assert!(matches!(err, TodoStoreError::Persistence(_)));
        assert_eq!(store.get_todo(todo.id).await.unwrap(), todo);
    }

    #[tokio::test]
    async fn test_closed_pool_is_persistence_error() {
        let store = test_store().await;
        store.pool().close().await;

        let err = store.get_todo(1).await.unwrap_err();

        assert!(matches!(err, TodoStoreError::Persistence(_)));
    }

    async fn file_store(dir: &tempfile::TempDir) -> SqliteTodoStore {
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("todos.db").display());
        let store = SqliteTodoStore::connect(&url, 5).await.unwrap();
        store.init().await.unwrap();
        store
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_updates_to_same_todo_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;
        let todo = store.create_todo(TodoCreate::new("a", "b")).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update_todo(todo.id, TodoUpdate::default().with_title(format!("title {i}")))
                        .await
                })
            })
            .collect();

        let mut titles = Vec::new();
        for handle in handles {
            titles.push(handle.await.unwrap().unwrap().title);
        }

        let stored = store.get_todo(todo.id).await.unwrap();
        assert!(titles.contains(&stored.title));
        assert_eq!(stored.description, "b");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_updates_to_distinct_todos_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;
        let mut ids = Vec::new();
        for i in 0..20 {
            let todo = store
                .create_todo(TodoCreate::new(format!("todo {i}"), "desc"))
                .await
                .unwrap();
            ids.push(todo.id);
        }

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update_todo(id, TodoUpdate::default().with_completed(true))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().completed);
        }
        let todos = store.list_todos(TodoFilter::default()).await.unwrap();
        assert!(todos.iter().all(|t| t.completed));
    }
}
