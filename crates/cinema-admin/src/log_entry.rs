//! Admin action log (`LogEntry`).
//!
//! Each time a staff user creates, changes, or deletes an object through the
//! admin, a row is written to the `admin_logentry` table. Entries are
//! inserted on the same connection (and transaction) as the change they
//! record; [`LogEntryStore`] reads them back for the history endpoints.

use chrono::{DateTime, Utc};
use cinema_core::{CinemaError, CinemaResult};
use cinema_db::{sql_error, Database};
use serde::Serialize;

use crate::model_admin::ModelAdmin;

/// What happened to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ActionFlag {
    Addition = 1,
    Change = 2,
    Deletion = 3,
}

impl ActionFlag {
    /// Returns the stored numeric value.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses a stored value.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Addition),
            2 => Some(Self::Change),
            3 => Some(Self::Deletion),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Addition => "Addition",
            Self::Change => "Change",
            Self::Deletion => "Deletion",
        }
    }
}

impl std::fmt::Display for ActionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single audit log row.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Zero until the entry has been stored.
    pub id: i64,
    pub action_time: DateTime<Utc>,
    pub username: String,
    pub app_label: String,
    pub model_name: String,
    pub object_id: String,
    pub object_repr: String,
    pub action_flag: ActionFlag,
    pub change_message: String,
}

impl LogEntry {
    /// Creates an unsaved entry stamped with the current time.
    pub fn new(
        username: &str,
        admin: &ModelAdmin,
        object_id: i64,
        object_repr: &str,
        action_flag: ActionFlag,
        change_message: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            action_time: Utc::now(),
            username: username.to_string(),
            app_label: admin.app_label.clone(),
            model_name: admin.model_name.clone(),
            object_id: object_id.to_string(),
            object_repr: object_repr.chars().take(200).collect(),
            action_flag,
            change_message: change_message.into(),
        }
    }

    /// Returns a one-line description, e.g. `"Change: Heat - Changed draft."`.
    pub fn description(&self) -> String {
        let action = self.action_flag.label();
        if self.change_message.is_empty() {
            format!("{action}: {}", self.object_repr)
        } else {
            format!("{action}: {} - {}", self.object_repr, self.change_message)
        }
    }

    /// Writes the entry and returns its id.
    pub fn insert(&self, conn: &rusqlite::Connection) -> CinemaResult<i64> {
        conn.execute(
            "INSERT INTO admin_logentry (action_time, username, app_label, model_name, \
             object_id, object_repr, action_flag, change_message) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                self.action_time,
                self.username,
                self.app_label,
                self.model_name,
                self.object_id,
                self.object_repr,
                self.action_flag.as_u8(),
                self.change_message,
            ],
        )
        .map_err(sql_error)?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let flag: u8 = row.get("action_flag")?;
        Ok(Self {
            id: row.get("id")?,
            action_time: row.get("action_time")?,
            username: row.get("username")?,
            app_label: row.get("app_label")?,
            model_name: row.get("model_name")?,
            object_id: row.get::<_, Option<String>>("object_id")?.unwrap_or_default(),
            object_repr: row.get("object_repr")?,
            action_flag: ActionFlag::from_u8(flag).unwrap_or(ActionFlag::Change),
            change_message: row.get("change_message")?,
        })
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {} (pk={}) by {}",
            self.action_time.format("%Y-%m-%d %H:%M:%S"),
            self.action_flag,
            self.object_repr,
            self.object_id,
            self.username,
        )
    }
}

/// Builds the change message recorded for an update.
///
/// ```
/// use cinema_admin::log_entry::change_message;
///
/// assert_eq!(change_message(&[]), "No fields changed.");
/// assert_eq!(change_message(&["draft".into()]), "Changed draft.");
/// assert_eq!(
///     change_message(&["title".into(), "year".into(), "draft".into()]),
///     "Changed title, year and draft."
/// );
/// ```
pub fn change_message(fields: &[String]) -> String {
    match fields {
        [] => "No fields changed.".to_string(),
        [only] => format!("Changed {only}."),
        [head @ .., last] => format!("Changed {} and {last}.", head.join(", ")),
    }
}

const SELECT: &str = "SELECT id, action_time, username, app_label, model_name, object_id, \
                      object_repr, action_flag, change_message FROM admin_logentry";

/// Read access to the audit log.
#[derive(Debug, Clone)]
pub struct LogEntryStore {
    db: Database,
}

impl LogEntryStore {
    /// Creates a store over the given database.
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the latest `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> CinemaResult<Vec<LogEntry>> {
        let limit = i64::try_from(limit)
            .map_err(|_| CinemaError::BadRequest("limit out of range".into()))?;
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!("{SELECT} ORDER BY id DESC LIMIT ?1"))
                    .map_err(sql_error)?;
                let rows = stmt
                    .query_map([limit], LogEntry::from_row)
                    .map_err(sql_error)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
            })
            .await
    }

    /// Returns the history of one object, oldest first.
    pub async fn for_object(
        &self,
        app_label: &str,
        model_name: &str,
        object_id: i64,
    ) -> CinemaResult<Vec<LogEntry>> {
        let (app, model, id) = (
            app_label.to_string(),
            model_name.to_string(),
            object_id.to_string(),
        );
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "{SELECT} WHERE app_label = ?1 AND model_name = ?2 AND object_id = ?3 \
                         ORDER BY id"
                    ))
                    .map_err(sql_error)?;
                let rows = stmt
                    .query_map([app, model, id], LogEntry::from_row)
                    .map_err(sql_error)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
            })
            .await
    }

    /// Returns the number of stored entries.
    pub async fn count(&self) -> CinemaResult<usize> {
        let n = self
            .db
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM admin_logentry", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(sql_error)
            })
            .await?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}
