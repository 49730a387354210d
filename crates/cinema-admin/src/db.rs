//! Admin database integration.
//!
//! This module provides the [`AdminDbExecutor`] trait behind the admin CRUD
//! endpoints and its `SQLite` implementation, [`SqliteAdminDb`].
//!
//! # Architecture
//!
//! The admin is generic over every registered model, so it works with
//! `serde_json` objects rather than typed rows. SQL is assembled from the
//! [`ModelAdmin`] configuration; identifiers always come from the
//! registration, and request values are always bound as parameters.
//!
//! - List queries join related tables through correlated subqueries, so a
//!   foreign key column shows the related row's display string.
//! - Every write runs in one transaction together with its audit log rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use cinema_core::utils::text::capfirst;
use cinema_core::{CinemaError, CinemaResult, ValidationError};
use cinema_db::database::{json_to_sql, query_json, sql_to_json};
use cinema_db::{sql_error, Database};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::log_entry::{change_message, ActionFlag, LogEntry};
use crate::model_admin::{
    FieldKind, FieldSchema, FilterChoice, InlineAdmin, ModelAdmin, ModelRegistry, STR_FIELD,
};
use crate::photo::PhotoPreview;
use crate::validation;

/// Upper bound for the `page_size` query parameter.
pub const MAX_PAGE_SIZE: usize = 500;

/// Parameters for an admin list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminListParams {
    /// The page number (1-indexed); out-of-range pages are clamped.
    pub page: Option<usize>,
    /// Rows per page; defaults to the model's `list_per_page`.
    pub page_size: Option<usize>,
    /// Whitespace-separated search terms, all of which must match.
    pub search: Option<String>,
    /// Comma-separated ordering fields (prefix with "-" for descending).
    pub ordering: Option<String>,
    /// Field-value filters.
    pub filters: BTreeMap<String, String>,
}

impl AdminListParams {
    /// Creates empty list parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page number.
    #[must_use]
    pub const fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the search query.
    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn ordering(mut self, field: impl Into<String>) -> Self {
        self.ordering = Some(field.into());
        self
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Splits raw query parameters into paging, search, ordering and filters.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::BadRequest`] if `page` or `page_size` is not a number.
    pub fn from_query(mut query: BTreeMap<String, String>) -> CinemaResult<Self> {
        let number = |key: &str, value: Option<String>| -> CinemaResult<Option<usize>> {
            value
                .filter(|v| !v.is_empty())
                .map(|v| {
                    v.parse()
                        .map_err(|_| CinemaError::BadRequest(format!("Invalid {key}: {v}")))
                })
                .transpose()
        };
        Ok(Self {
            page: number("page", query.remove("page"))?,
            page_size: number("page_size", query.remove("page_size"))?,
            search: query.remove("search").filter(|s| !s.trim().is_empty()),
            ordering: query.remove("ordering").filter(|s| !s.is_empty()),
            filters: query.into_iter().filter(|(_, v)| !v.is_empty()).collect(),
        })
    }
}

/// One page of list rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub rows: Vec<Value>,
    /// Rows matching the query across all pages.
    pub count: usize,
    /// The page actually returned.
    pub page: usize,
    pub page_size: usize,
}

/// The child rows of one inline editor.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineRows {
    /// The child model key.
    pub model: String,
    pub rows: Vec<Map<String, Value>>,
}

/// The result of a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub pk: i64,
    /// Display string of the saved row.
    pub repr: String,
    /// Editable fields that were submitted.
    pub changed: Vec<String>,
}

/// Database operations behind the admin endpoints.
///
/// Objects are exchanged as JSON maps. Writes that take a `user` record
/// audit log entries under that username.
#[async_trait]
pub trait AdminDbExecutor: Send + Sync {
    /// Lists rows with search, filters, ordering and pagination applied.
    async fn list_objects(&self, admin: &ModelAdmin, params: &AdminListParams)
        -> CinemaResult<ListPage>;

    /// Returns the choices of every list filter, keyed by field name.
    async fn filter_choices(
        &self,
        admin: &ModelAdmin,
    ) -> CinemaResult<BTreeMap<String, Vec<FilterChoice>>>;

    /// Fetches one object with relation ids, previews and `__str__`.
    async fn get_object(&self, admin: &ModelAdmin, pk: i64) -> CinemaResult<Map<String, Value>>;

    /// Fetches the child rows of every inline of `admin` for parent `pk`.
    async fn inline_rows(&self, admin: &ModelAdmin, pk: i64) -> CinemaResult<Vec<InlineRows>>;

    /// Validates and inserts a new object (and its `_inlines` rows).
    async fn create_object(
        &self,
        admin: &ModelAdmin,
        data: &Map<String, Value>,
        user: &str,
    ) -> CinemaResult<SaveOutcome>;

    /// Validates and applies the submitted fields (and `_inlines` rows) to `pk`.
    async fn update_object(
        &self,
        admin: &ModelAdmin,
        pk: i64,
        data: &Map<String, Value>,
        user: &str,
    ) -> CinemaResult<SaveOutcome>;

    /// Applies list-editable changes to several rows atomically.
    async fn bulk_edit(
        &self,
        admin: &ModelAdmin,
        rows: Vec<(i64, Map<String, Value>)>,
        user: &str,
    ) -> CinemaResult<usize>;

    /// Deletes the given rows; unknown ids are skipped. Returns the number deleted.
    async fn delete_objects(&self, admin: &ModelAdmin, ids: &[i64], user: &str)
        -> CinemaResult<usize>;

    /// Sets one column on the given rows without validation or logging.
    /// Returns the number of rows matched.
    async fn update_column(
        &self,
        admin: &ModelAdmin,
        ids: &[i64],
        field: &str,
        value: Value,
    ) -> CinemaResult<usize>;

    /// Inserts or overwrites a fixture object, keeping its primary key.
    async fn load_object(
        &self,
        admin: &ModelAdmin,
        pk: Option<i64>,
        fields: &Map<String, Value>,
    ) -> CinemaResult<i64>;
}

/// The `SQLite` implementation of [`AdminDbExecutor`].
#[derive(Debug, Clone)]
pub struct SqliteAdminDb {
    db: Database,
    registry: Arc<ModelRegistry>,
    media_url: String,
}

impl SqliteAdminDb {
    /// Creates the executor. `registry` resolves relations between models.
    pub fn new(db: Database, registry: Arc<ModelRegistry>, media_url: impl Into<String>) -> Self {
        Self {
            db,
            registry,
            media_url: media_url.into(),
        }
    }

    /// Returns the underlying database handle.
    pub const fn database(&self) -> &Database {
        &self.db
    }

    async fn with_ctx<F, T>(&self, admin: &ModelAdmin, f: F) -> CinemaResult<T>
    where
        F: FnOnce(&Connection, &Ctx<'_>, &ModelAdmin) -> CinemaResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        let media_url = self.media_url.clone();
        let admin = admin.clone();
        self.db
            .transaction(move |tx| {
                let ctx = Ctx {
                    registry: &registry,
                    media_url: &media_url,
                };
                let conn: &Connection = tx;
                f(conn, &ctx, &admin)
            })
            .await
    }
}

#[async_trait]
impl AdminDbExecutor for SqliteAdminDb {
    async fn list_objects(
        &self,
        admin: &ModelAdmin,
        params: &AdminListParams,
    ) -> CinemaResult<ListPage> {
        let params = params.clone();
        self.with_ctx(admin, move |conn, ctx, admin| list_rows(conn, ctx, admin, &params))
            .await
    }

    async fn filter_choices(
        &self,
        admin: &ModelAdmin,
    ) -> CinemaResult<BTreeMap<String, Vec<FilterChoice>>> {
        self.with_ctx(admin, |conn, ctx, admin| filter_choices(conn, ctx, admin))
            .await
    }

    async fn get_object(&self, admin: &ModelAdmin, pk: i64) -> CinemaResult<Map<String, Value>> {
        self.with_ctx(admin, move |conn, ctx, admin| load_object(conn, ctx, admin, pk))
            .await
    }

    async fn inline_rows(&self, admin: &ModelAdmin, pk: i64) -> CinemaResult<Vec<InlineRows>> {
        self.with_ctx(admin, move |conn, ctx, admin| {
            admin
                .inlines
                .iter()
                .map(|inline| load_inline(conn, ctx, inline, pk))
                .collect()
        })
        .await
    }

    async fn create_object(
        &self,
        admin: &ModelAdmin,
        data: &Map<String, Value>,
        user: &str,
    ) -> CinemaResult<SaveOutcome> {
        let (data, user) = (data.clone(), user.to_string());
        self.with_ctx(admin, move |conn, ctx, admin| {
            save_with_inlines(conn, ctx, admin, None, &data, &user)
        })
        .await
    }

    async fn update_object(
        &self,
        admin: &ModelAdmin,
        pk: i64,
        data: &Map<String, Value>,
        user: &str,
    ) -> CinemaResult<SaveOutcome> {
        let (data, user) = (data.clone(), user.to_string());
        self.with_ctx(admin, move |conn, ctx, admin| {
            save_with_inlines(conn, ctx, admin, Some(pk), &data, &user)
        })
        .await
    }

    async fn bulk_edit(
        &self,
        admin: &ModelAdmin,
        rows: Vec<(i64, Map<String, Value>)>,
        user: &str,
    ) -> CinemaResult<usize> {
        let user = user.to_string();
        self.with_ctx(admin, move |conn, _ctx, admin| {
            for (pk, data) in &rows {
                if let Some(key) = data
                    .keys()
                    .find(|k| *k != "id" && !admin.list_editable.contains(*k))
                {
                    return Err(CinemaError::BadRequest(format!(
                        "Field '{key}' is not editable from the list"
                    )));
                }
                let outcome = save_object(conn, admin, Some(*pk), data, &[], &[])?;
                LogEntry::new(
                    &user,
                    admin,
                    outcome.pk,
                    &outcome.repr,
                    ActionFlag::Change,
                    change_message(&outcome.changed),
                )
                .insert(conn)?;
            }
            Ok(rows.len())
        })
        .await
    }

    async fn delete_objects(
        &self,
        admin: &ModelAdmin,
        ids: &[i64],
        user: &str,
    ) -> CinemaResult<usize> {
        let (ids, user) = (ids.to_vec(), user.to_string());
        self.with_ctx(admin, move |conn, _ctx, admin| {
            let mut deleted = 0;
            for pk in ids {
                let repr = match object_repr(conn, admin, pk) {
                    Ok(repr) => repr,
                    Err(CinemaError::DoesNotExist(_)) => continue,
                    Err(e) => return Err(e),
                };
                conn.execute(&format!("DELETE FROM {} WHERE id = ?1", admin.table), [pk])
                    .map_err(sql_error)?;
                LogEntry::new(&user, admin, pk, &repr, ActionFlag::Deletion, "").insert(conn)?;
                deleted += 1;
            }
            tracing::info!(model = %admin.model_key(), deleted, "deleted objects");
            Ok(deleted)
        })
        .await
    }

    async fn update_column(
        &self,
        admin: &ModelAdmin,
        ids: &[i64],
        field: &str,
        value: Value,
    ) -> CinemaResult<usize> {
        let column = admin
            .field(field)
            .and_then(FieldSchema::column)
            .ok_or_else(|| {
                CinemaError::ConfigurationError(format!(
                    "{} has no column '{field}'",
                    admin.model_key()
                ))
            })?;
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.to_vec();
        self.with_ctx(admin, move |conn, _ctx, admin| {
            let mut params = vec![json_to_sql(&value)];
            params.extend(ids.iter().map(|id| SqlValue::Integer(*id)));
            conn.execute(
                &format!(
                    "UPDATE {} SET {column} = ? WHERE id IN ({})",
                    admin.table,
                    placeholders(ids.len())
                ),
                rusqlite::params_from_iter(params.iter()),
            )
            .map_err(sql_error)
        })
        .await
    }

    async fn load_object(
        &self,
        admin: &ModelAdmin,
        pk: Option<i64>,
        fields: &Map<String, Value>,
    ) -> CinemaResult<i64> {
        let fields = fields.clone();
        self.with_ctx(admin, move |conn, _ctx, admin| {
            let existing = match pk {
                Some(pk) => row_exists(conn, &admin.table, pk)?,
                None => false,
            };
            let outcome = if existing {
                save_object(conn, admin, pk, &fields, &[], &[])?
            } else {
                let forced: Vec<(String, SqlValue)> = pk
                    .map(|pk| vec![("id".to_string(), SqlValue::Integer(pk))])
                    .unwrap_or_default();
                save_object(conn, admin, None, &fields, &[], &forced)?
            };
            Ok(outcome.pk)
        })
        .await
    }
}

// ============================================================
// SQL building
// ============================================================

struct Ctx<'a> {
    registry: &'a ModelRegistry,
    media_url: &'a str,
}

impl Ctx<'_> {
    fn related(&self, field: &FieldSchema) -> CinemaResult<&ModelAdmin> {
        field
            .related_model()
            .and_then(|key| self.registry.get(key))
            .ok_or_else(|| {
                CinemaError::ConfigurationError(format!(
                    "Related model of '{}' is not registered",
                    field.name
                ))
            })
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn like_pattern(term: &str) -> SqlValue {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    SqlValue::Text(format!("%{escaped}%"))
}

fn config_error(admin: &ModelAdmin, what: &str, name: &str) -> CinemaError {
    CinemaError::ConfigurationError(format!(
        "{}: {what} refers to unknown field '{name}'",
        admin.model_key()
    ))
}

/// The select expression of one list column.
fn list_column(ctx: &Ctx<'_>, admin: &ModelAdmin, name: &str) -> CinemaResult<String> {
    if name == STR_FIELD {
        return Ok(format!("({}) AS \"{STR_FIELD}\"", admin.str_sql));
    }
    if let Some(preview) = admin.preview_named(name) {
        return Ok(format!("t.{} AS \"{name}\"", preview.source));
    }
    let field = admin
        .field(name)
        .ok_or_else(|| config_error(admin, "list_display", name))?;
    match &field.kind {
        FieldKind::ForeignKey { .. } => {
            let related = ctx.related(field)?;
            Ok(format!(
                "(SELECT {} FROM {} WHERE id = t.{name}_id) AS \"{name}\"",
                related.str_sql, related.table
            ))
        }
        FieldKind::ManyToMany { .. } => Err(CinemaError::ConfigurationError(format!(
            "{}: many-to-many field '{name}' cannot be a list column",
            admin.model_key()
        ))),
        _ => Ok(format!("t.{name} AS \"{name}\"")),
    }
}

/// The condition matching one search field against one term.
fn search_condition(ctx: &Ctx<'_>, admin: &ModelAdmin, path: &str) -> CinemaResult<String> {
    let Some((name, sub)) = path.split_once("__") else {
        let column = admin
            .field(path)
            .and_then(FieldSchema::column)
            .ok_or_else(|| config_error(admin, "search_fields", path))?;
        return Ok(format!("t.{column} LIKE ? ESCAPE '\\'"));
    };
    let field = admin
        .field(name)
        .ok_or_else(|| config_error(admin, "search_fields", path))?;
    let related = ctx.related(field)?;
    let sub_column = related
        .field(sub)
        .and_then(FieldSchema::column)
        .ok_or_else(|| config_error(admin, "search_fields", path))?;
    match &field.kind {
        FieldKind::ForeignKey { .. } => Ok(format!(
            "t.{name}_id IN (SELECT id FROM {} WHERE {sub_column} LIKE ? ESCAPE '\\')",
            related.table
        )),
        FieldKind::ManyToMany {
            join_table,
            source_column,
            target_column,
            ..
        } => Ok(format!(
            "t.id IN (SELECT j.{source_column} FROM {join_table} AS j \
             JOIN {} AS r ON r.id = j.{target_column} WHERE r.{sub_column} LIKE ? ESCAPE '\\')",
            related.table
        )),
        _ => Err(config_error(admin, "search_fields", path)),
    }
}

fn parse_filter_int(name: &str, value: &str) -> CinemaResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| CinemaError::BadRequest(format!("Invalid value for filter '{name}': {value}")))
}

/// The condition (and bound value) of one list filter.
fn filter_condition(
    admin: &ModelAdmin,
    name: &str,
    value: &str,
) -> CinemaResult<(String, SqlValue)> {
    if !admin.list_filter.iter().any(|f| f == name) {
        return Err(CinemaError::BadRequest(format!("Unknown filter: {name}")));
    }
    let field = admin
        .field(name)
        .ok_or_else(|| config_error(admin, "list_filter", name))?;
    match &field.kind {
        FieldKind::ForeignKey { .. } => Ok((
            format!("t.{name}_id = ?"),
            SqlValue::Integer(parse_filter_int(name, value)?),
        )),
        FieldKind::ManyToMany {
            join_table,
            source_column,
            target_column,
            ..
        } => Ok((
            format!(
                "t.id IN (SELECT {source_column} FROM {join_table} WHERE {target_column} = ?)"
            ),
            SqlValue::Integer(parse_filter_int(name, value)?),
        )),
        FieldKind::Boolean => {
            let flag = match value {
                "1" | "true" | "True" => 1,
                "0" | "false" | "False" => 0,
                _ => {
                    return Err(CinemaError::BadRequest(format!(
                        "Invalid value for filter '{name}': {value}"
                    )))
                }
            };
            Ok((format!("t.{name} = ?"), SqlValue::Integer(flag)))
        }
        FieldKind::AutoId | FieldKind::PositiveInteger | FieldKind::SmallInteger => Ok((
            format!("t.{name} = ?"),
            SqlValue::Integer(parse_filter_int(name, value)?),
        )),
        _ => Ok((format!("t.{name} = ?"), SqlValue::Text(value.to_string()))),
    }
}

fn where_clause(
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
    params: &AdminListParams,
) -> CinemaResult<(String, Vec<SqlValue>)> {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(search) = &params.search {
        if admin.search_fields.is_empty() {
            return Err(CinemaError::BadRequest(format!(
                "{} does not support search",
                admin.model_key()
            )));
        }
        for term in search.split_whitespace() {
            let mut ors = Vec::with_capacity(admin.search_fields.len());
            for path in &admin.search_fields {
                ors.push(search_condition(ctx, admin, path)?);
                values.push(like_pattern(term));
            }
            conditions.push(format!("({})", ors.join(" OR ")));
        }
    }

    for (name, value) in &params.filters {
        let (condition, value) = filter_condition(admin, name, value)?;
        conditions.push(condition);
        values.push(value);
    }

    if conditions.is_empty() {
        Ok((String::new(), values))
    } else {
        Ok((format!(" WHERE {}", conditions.join(" AND ")), values))
    }
}

fn order_clause(admin: &ModelAdmin, ordering: Option<&str>) -> CinemaResult<String> {
    let requested: Vec<String> = ordering
        .map(|o| {
            o.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .filter(|v: &Vec<String>| !v.is_empty())
        .unwrap_or_else(|| admin.effective_ordering());

    let mut terms = Vec::with_capacity(requested.len() + 1);
    let mut has_id = false;
    for item in &requested {
        let (name, direction) = item
            .strip_prefix('-')
            .map_or((item.as_str(), "ASC"), |name| (name, "DESC"));
        let column = if name == "id" || name == "pk" {
            has_id = true;
            "id".to_string()
        } else {
            admin
                .field(name)
                .and_then(FieldSchema::column)
                .ok_or_else(|| CinemaError::BadRequest(format!("Cannot order by '{name}'")))?
        };
        terms.push(format!("t.{column} {direction}"));
    }
    if !has_id {
        terms.push("t.id DESC".to_string());
    }
    Ok(format!(" ORDER BY {}", terms.join(", ")))
}

fn to_bool(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Bool(n.as_i64() != Some(0)),
        other => other,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn count_rows(conn: &Connection, sql: &str, params: &[SqlValue]) -> CinemaResult<usize> {
    let n: i64 = conn
        .query_row(sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))
        .map_err(sql_error)?;
    Ok(usize::try_from(n).unwrap_or_default())
}

fn row_exists(conn: &Connection, table: &str, pk: i64) -> CinemaResult<bool> {
    let n = count_rows(
        conn,
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?"),
        &[SqlValue::Integer(pk)],
    )?;
    Ok(n > 0)
}

fn does_not_exist(admin: &ModelAdmin, pk: i64) -> CinemaError {
    CinemaError::DoesNotExist(format!(
        "{} with ID “{pk}” doesn’t exist.",
        capfirst(&admin.verbose_name)
    ))
}

// ============================================================
// Reads
// ============================================================

fn list_rows(
    conn: &Connection,
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
    params: &AdminListParams,
) -> CinemaResult<ListPage> {
    let (where_sql, mut values) = where_clause(ctx, admin, params)?;
    let order_sql = order_clause(admin, params.ordering.as_deref())?;

    let count = count_rows(
        conn,
        &format!("SELECT COUNT(*) FROM {} AS t{where_sql}", admin.table),
        &values,
    )?;
    let page_size = params
        .page_size
        .unwrap_or(admin.list_per_page)
        .clamp(1, MAX_PAGE_SIZE);
    let total_pages = count.div_ceil(page_size).max(1);
    let page = params.page.unwrap_or(1).clamp(1, total_pages);

    let mut columns = vec!["t.id AS id".to_string()];
    for name in admin.list_display.iter().filter(|n| *n != "id") {
        columns.push(list_column(ctx, admin, name)?);
    }
    let sql = format!(
        "SELECT {} FROM {} AS t{where_sql}{order_sql} LIMIT ? OFFSET ?",
        columns.join(", "),
        admin.table
    );
    values.push(SqlValue::Integer(i64::try_from(page_size).unwrap_or(i64::MAX)));
    values.push(SqlValue::Integer(
        i64::try_from((page - 1) * page_size).unwrap_or(i64::MAX),
    ));

    let rows = query_json(conn, &sql, &values)?
        .into_iter()
        .map(|mut row| {
            for name in &admin.list_display {
                if let Some(preview) = admin.preview_named(name) {
                    let path = row.get(name).map(display_value).unwrap_or_default();
                    row.insert(name.clone(), Value::String(preview.render(ctx.media_url, &path)));
                } else if admin.field(name).is_some_and(|f| f.kind == FieldKind::Boolean) {
                    if let Some(v) = row.remove(name) {
                        row.insert(name.clone(), to_bool(v));
                    }
                }
            }
            Value::Object(row)
        })
        .collect();

    Ok(ListPage {
        rows,
        count,
        page,
        page_size,
    })
}

fn filter_choices(
    conn: &Connection,
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
) -> CinemaResult<BTreeMap<String, Vec<FilterChoice>>> {
    let mut choices = BTreeMap::new();
    for name in &admin.list_filter {
        let field = admin
            .field(name)
            .ok_or_else(|| config_error(admin, "list_filter", name))?;
        let options = match &field.kind {
            FieldKind::ForeignKey { .. } | FieldKind::ManyToMany { .. } => {
                let related = ctx.related(field)?;
                query_json(
                    conn,
                    &format!(
                        "SELECT id, ({}) AS label FROM {} ORDER BY label",
                        related.str_sql, related.table
                    ),
                    &[],
                )?
                .iter()
                .map(|row| {
                    FilterChoice::new(
                        row.get("label").map(display_value).unwrap_or_default(),
                        row.get("id").map(display_value).unwrap_or_default(),
                    )
                })
                .collect()
            }
            FieldKind::Boolean => vec![FilterChoice::new("Yes", "1"), FilterChoice::new("No", "0")],
            _ => {
                let column = field
                    .column()
                    .ok_or_else(|| config_error(admin, "list_filter", name))?;
                query_json(
                    conn,
                    &format!(
                        "SELECT DISTINCT {column} AS v FROM {} WHERE {column} IS NOT NULL ORDER BY v",
                        admin.table
                    ),
                    &[],
                )?
                .iter()
                .map(|row| {
                    let value = row.get("v").map(display_value).unwrap_or_default();
                    FilterChoice::new(value.clone(), value)
                })
                .collect()
            }
        };
        choices.insert(name.clone(), options);
    }
    Ok(choices)
}

/// Turns a `SELECT t.*, ... AS "__str__"` row into the admin's object shape.
fn present_row(
    conn: &Connection,
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
    row: &Map<String, Value>,
    previews: &[PhotoPreview],
) -> CinemaResult<Map<String, Value>> {
    let pk = row.get("id").and_then(Value::as_i64).unwrap_or_default();
    let mut object = Map::new();
    object.insert("id".to_string(), Value::from(pk));

    for field in &admin.fields {
        let value = match &field.kind {
            FieldKind::AutoId => continue,
            FieldKind::ForeignKey { .. } => row
                .get(&format!("{}_id", field.name))
                .cloned()
                .unwrap_or(Value::Null),
            FieldKind::Boolean => to_bool(row.get(&field.name).cloned().unwrap_or(Value::Null)),
            FieldKind::ManyToMany {
                join_table,
                source_column,
                target_column,
                ..
            } => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {target_column} FROM {join_table} WHERE {source_column} = ?1 \
                         ORDER BY {target_column}"
                    ))
                    .map_err(sql_error)?;
                let ids = stmt
                    .query_map([pk], |r| r.get::<_, i64>(0))
                    .map_err(sql_error)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(sql_error)?;
                Value::from(ids)
            }
            _ => row.get(&field.name).cloned().unwrap_or(Value::Null),
        };
        object.insert(field.name.clone(), value);
    }

    for preview in previews {
        let path = row.get(&preview.source).map(display_value).unwrap_or_default();
        object.insert(
            preview.name.clone(),
            Value::String(preview.render(ctx.media_url, &path)),
        );
    }

    object.insert(
        STR_FIELD.to_string(),
        Value::String(row.get(STR_FIELD).map(display_value).unwrap_or_default()),
    );
    Ok(object)
}

fn load_object(
    conn: &Connection,
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
    pk: i64,
) -> CinemaResult<Map<String, Value>> {
    let rows = query_json(
        conn,
        &format!(
            "SELECT t.*, ({}) AS \"{STR_FIELD}\" FROM {} AS t WHERE t.id = ?",
            admin.str_sql, admin.table
        ),
        &[SqlValue::Integer(pk)],
    )?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| does_not_exist(admin, pk))?;
    present_row(conn, ctx, admin, &row, &admin.previews)
}

fn inline_fk_column(child: &ModelAdmin, inline: &InlineAdmin) -> CinemaResult<String> {
    child
        .field(&inline.fk_name)
        .and_then(FieldSchema::column)
        .ok_or_else(|| config_error(child, "inline fk_name", &inline.fk_name))
}

fn inline_child<'a>(ctx: &Ctx<'a>, inline: &InlineAdmin) -> CinemaResult<&'a ModelAdmin> {
    ctx.registry.get(&inline.model).ok_or_else(|| {
        CinemaError::ConfigurationError(format!("Inline model {} is not registered", inline.model))
    })
}

fn load_inline(
    conn: &Connection,
    ctx: &Ctx<'_>,
    inline: &InlineAdmin,
    parent_pk: i64,
) -> CinemaResult<InlineRows> {
    let child = inline_child(ctx, inline)?;
    let fk = inline_fk_column(child, inline)?;
    let previews: Vec<PhotoPreview> = inline
        .previews
        .iter()
        .chain(child.previews.iter().filter(|p| !inline.is_readonly(&p.name)))
        .cloned()
        .collect();
    let rows = query_json(
        conn,
        &format!(
            "SELECT t.*, ({}) AS \"{STR_FIELD}\" FROM {} AS t WHERE t.{fk} = ? ORDER BY t.id",
            child.str_sql, child.table
        ),
        &[SqlValue::Integer(parent_pk)],
    )?;
    let rows = rows
        .iter()
        .map(|row| present_row(conn, ctx, child, row, &previews))
        .collect::<CinemaResult<Vec<_>>>()?;
    Ok(InlineRows {
        model: inline.model.clone(),
        rows,
    })
}

fn object_repr(conn: &Connection, admin: &ModelAdmin, pk: i64) -> CinemaResult<String> {
    conn.query_row(
        &format!("SELECT ({}) FROM {} AS t WHERE t.id = ?1", admin.str_sql, admin.table),
        [pk],
        |row| row.get_ref(0).map(|v| display_value(&sql_to_json(v))),
    )
    .map_err(|e| match sql_error(e) {
        CinemaError::DoesNotExist(_) => does_not_exist(admin, pk),
        other => other,
    })
}

// ============================================================
// Writes
// ============================================================

/// Validates and writes one row. `forced` columns override submitted values.
fn save_object(
    conn: &Connection,
    admin: &ModelAdmin,
    pk: Option<i64>,
    data: &Map<String, Value>,
    extra_readonly: &[String],
    forced: &[(String, SqlValue)],
) -> CinemaResult<SaveOutcome> {
    let mut cleaned = validation::clean(admin, data, pk.is_none(), extra_readonly)?;
    for (column, value) in forced {
        cleaned.columns.retain(|(c, _)| c != column);
        cleaned.columns.push((column.clone(), value.clone()));
    }
    let values: Vec<SqlValue> = cleaned.columns.iter().map(|(_, v)| v.clone()).collect();
    let names: Vec<&str> = cleaned.columns.iter().map(|(c, _)| c.as_str()).collect();

    let pk = match pk {
        None => {
            let sql = if names.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", admin.table)
            } else {
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    admin.table,
                    names.join(", "),
                    placeholders(names.len())
                )
            };
            conn.execute(&sql, rusqlite::params_from_iter(values.iter()))
                .map_err(sql_error)?;
            conn.last_insert_rowid()
        }
        Some(pk) => {
            if !row_exists(conn, &admin.table, pk)? {
                return Err(does_not_exist(admin, pk));
            }
            if !names.is_empty() {
                let assignments: Vec<String> = names.iter().map(|c| format!("{c} = ?")).collect();
                let mut values = values;
                values.push(SqlValue::Integer(pk));
                conn.execute(
                    &format!(
                        "UPDATE {} SET {} WHERE id = ?",
                        admin.table,
                        assignments.join(", ")
                    ),
                    rusqlite::params_from_iter(values.iter()),
                )
                .map_err(sql_error)?;
            }
            pk
        }
    };

    for (name, ids) in &cleaned.many_to_many {
        let Some(FieldKind::ManyToMany {
            join_table,
            source_column,
            target_column,
            ..
        }) = admin.field(name).map(|f| &f.kind)
        else {
            continue;
        };
        conn.execute(
            &format!("DELETE FROM {join_table} WHERE {source_column} = ?1"),
            [pk],
        )
        .map_err(sql_error)?;
        let mut stmt = conn
            .prepare(&format!(
                "INSERT INTO {join_table} ({source_column}, {target_column}) VALUES (?1, ?2)"
            ))
            .map_err(sql_error)?;
        for id in ids {
            stmt.execute([pk, *id]).map_err(sql_error)?;
        }
    }

    Ok(SaveOutcome {
        pk,
        repr: object_repr(conn, admin, pk)?,
        changed: cleaned.changed,
    })
}

/// Re-keys an inline row's field errors as `model[index].field`.
fn prefix_errors(err: CinemaError, model: &str, index: usize) -> CinemaError {
    match err {
        CinemaError::ValidationError(inner) => {
            let mut out = ValidationError::empty();
            for (field, errors) in inner.field_errors {
                for e in errors {
                    out.add_field_error(format!("{model}[{index}].{field}"), e);
                }
            }
            if !inner.message.is_empty() {
                out.add_field_error(
                    format!("{model}[{index}]"),
                    ValidationError::new(inner.message, inner.code),
                );
            }
            CinemaError::ValidationError(out)
        }
        other => other,
    }
}

fn save_inlines(
    conn: &Connection,
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
    parent_pk: i64,
    inlines: &Value,
) -> CinemaResult<Vec<String>> {
    let Value::Object(inlines) = inlines else {
        return Err(CinemaError::BadRequest("_inlines must be an object".into()));
    };
    let mut messages = Vec::new();

    for (model, rows) in inlines {
        let inline = admin
            .inlines
            .iter()
            .find(|i| i.model == *model)
            .ok_or_else(|| {
                CinemaError::BadRequest(format!(
                    "{model} is not an inline of {}",
                    admin.model_key()
                ))
            })?;
        let child = inline_child(ctx, inline)?;
        let fk = inline_fk_column(child, inline)?;
        let mut readonly = inline.readonly_fields.clone();
        readonly.push(inline.fk_name.clone());
        let forced = [(fk.clone(), SqlValue::Integer(parent_pk))];

        let Value::Array(rows) = rows else {
            return Err(CinemaError::BadRequest(format!("_inlines.{model} must be a list")));
        };
        for (index, row) in rows.iter().enumerate() {
            let Value::Object(row) = row else {
                return Err(CinemaError::BadRequest(format!(
                    "_inlines.{model}[{index}] must be an object"
                )));
            };
            if row.is_empty() {
                continue;
            }
            let id = row.get("id").and_then(Value::as_i64);
            let delete = row.get("_delete").and_then(Value::as_bool).unwrap_or(false);
            match id {
                Some(id) => {
                    let owned = count_rows(
                        conn,
                        &format!("SELECT COUNT(*) FROM {} WHERE id = ? AND {fk} = ?", child.table),
                        &[SqlValue::Integer(id), SqlValue::Integer(parent_pk)],
                    )? > 0;
                    if !owned {
                        return Err(CinemaError::BadRequest(format!(
                            "{model} {id} does not belong to this {}",
                            admin.verbose_name
                        )));
                    }
                    if delete {
                        let repr = object_repr(conn, child, id)?;
                        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", child.table), [id])
                            .map_err(sql_error)?;
                        messages.push(format!("Deleted {} “{repr}”.", child.verbose_name));
                    } else {
                        let outcome = save_object(conn, child, Some(id), row, &readonly, &forced)
                            .map_err(|e| prefix_errors(e, model, index))?;
                        if !outcome.changed.is_empty() {
                            messages.push(format!(
                                "Changed {} for {} “{}”.",
                                outcome.changed.join(", "),
                                child.verbose_name,
                                outcome.repr
                            ));
                        }
                    }
                }
                None if delete => {}
                None => {
                    let outcome = save_object(conn, child, None, row, &readonly, &forced)
                        .map_err(|e| prefix_errors(e, model, index))?;
                    messages.push(format!("Added {} “{}”.", child.verbose_name, outcome.repr));
                }
            }
        }
    }
    Ok(messages)
}

fn save_with_inlines(
    conn: &Connection,
    ctx: &Ctx<'_>,
    admin: &ModelAdmin,
    pk: Option<i64>,
    data: &Map<String, Value>,
    user: &str,
) -> CinemaResult<SaveOutcome> {
    let outcome = save_object(conn, admin, pk, data, &[], &[])?;
    let inline_messages = match data.get("_inlines") {
        Some(inlines) => save_inlines(conn, ctx, admin, outcome.pk, inlines)?,
        None => Vec::new(),
    };

    let (flag, head) = if pk.is_none() {
        (ActionFlag::Addition, "Added.".to_string())
    } else {
        (ActionFlag::Change, change_message(&outcome.changed))
    };
    let message = std::iter::once(head)
        .chain(inline_messages)
        .collect::<Vec<_>>()
        .join(" ");
    LogEntry::new(user, admin, outcome.pk, &outcome.repr, flag, message).insert(conn)?;

    tracing::info!(
        model = %admin.model_key(),
        pk = outcome.pk,
        user,
        action = %flag,
        "saved object"
    );
    Ok(outcome)
}
