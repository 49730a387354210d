//! The `SQLite` connection handle.
//!
//! [`Database`] wraps a single `rusqlite` connection behind an async mutex.
//! Work is shipped to the blocking thread pool with
//! `tokio::task::spawn_blocking`, so handlers never block the runtime.
//!
//! - WAL journal mode and foreign key enforcement are switched on at open.
//! - `:memory:` opens a private in-memory database (used throughout the tests).

use std::sync::Arc;

use cinema_core::{CinemaError, CinemaResult};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::ErrorCode;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// A cloneable handle to the catalog database.
#[derive(Clone)]
pub struct Database {
    path: String,
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Opens the database at `path`, or an in-memory database for `:memory:`.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::OperationalError`] if the file cannot be opened.
    pub fn open(path: &str) -> CinemaResult<Self> {
        let conn = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(path)
        }
        .map_err(|e| CinemaError::OperationalError(format!("SQLite open failed: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| CinemaError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path, "opened database");

        Ok(Self {
            path: path.to_string(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> CinemaResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the path the database was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs `f` with exclusive access to the connection on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a [`CinemaError::DatabaseError`] if
    /// the blocking task panicked.
    pub async fn call<F, T>(&self, f: F) -> CinemaResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> CinemaResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await
        .map_err(|e| CinemaError::DatabaseError(format!("Task join error: {e}")))?
    }

    /// Runs `f` inside a transaction that commits when `f` succeeds.
    ///
    /// # Errors
    ///
    /// Returns the error from `f` (after rolling back) or from `COMMIT`.
    pub async fn transaction<F, T>(&self, f: F) -> CinemaResult<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> CinemaResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.call(move |conn| {
            let tx = conn.transaction().map_err(sql_error)?;
            let value = f(&tx)?;
            tx.commit().map_err(sql_error)?;
            Ok(value)
        })
        .await
    }
}

/// Maps a `rusqlite` error onto [`CinemaError`].
///
/// Constraint violations (unique, foreign key, check) become
/// [`CinemaError::IntegrityError`]; an empty single-row query becomes
/// [`CinemaError::DoesNotExist`].
pub fn sql_error(err: rusqlite::Error) -> CinemaError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => {
            CinemaError::DoesNotExist("No rows returned".to_string())
        }
        rusqlite::Error::SqliteFailure(ref failure, ref msg) => {
            let detail = msg.clone().unwrap_or_else(|| err.to_string());
            match failure.code {
                ErrorCode::ConstraintViolation => CinemaError::IntegrityError(detail),
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::ReadOnly => CinemaError::OperationalError(detail),
                _ => CinemaError::DatabaseError(detail),
            }
        }
        other => CinemaError::DatabaseError(other.to_string()),
    }
}

/// Converts a JSON value into a bindable SQL value.
///
/// Booleans are stored as `0`/`1`; arrays and objects as JSON text.
pub fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Converts a column value into JSON.
pub fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
    }
}

/// Runs a query and returns every row as a JSON object keyed by column name.
///
/// # Errors
///
/// Returns the mapped `rusqlite` error if preparing or stepping fails.
pub fn query_json(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[SqlValue],
) -> CinemaResult<Vec<Map<String, Value>>> {
    let mut stmt = conn.prepare(sql).map_err(sql_error)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt
        .query(rusqlite::params_from_iter(params.iter()))
        .map_err(sql_error)?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_error)? {
        let mut object = Map::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            let value = row.get_ref(i).map_err(sql_error)?;
            object.insert(name.clone(), sql_to_json(value));
        }
        out.push(object);
    }
    Ok(out)
}
