//! Cleaning of submitted admin data.
//!
//! [`clean`] turns a JSON object posted to a create or update endpoint into
//! column values ready for SQL, collecting every problem into one
//! [`ValidationError`] keyed by field name.
//!
//! - Keys starting with `_` are control keys (`_inlines`, `_delete`) and
//!   are skipped; `__str__` falls under the same rule.
//! - Unknown fields are rejected; read-only fields are ignored.
//! - Blank prepopulated slugs are filled from their source fields.

use chrono::NaiveDate;
use cinema_core::utils::text::{is_valid_email, is_valid_slug, slugify};
use cinema_core::ValidationError;
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

use crate::model_admin::{FieldKind, FieldSchema, ModelAdmin};

const REQUIRED: &str = "This field is required.";

/// Column values extracted from a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedData {
    /// `(column, value)` pairs for the model's own table.
    pub columns: Vec<(String, SqlValue)>,
    /// `(field name, related ids)` for many-to-many fields.
    pub many_to_many: Vec<(String, Vec<i64>)>,
    /// Names of the editable fields that were submitted.
    pub changed: Vec<String>,
}

impl CleanedData {
    /// Returns the cleaned value of a column.
    pub fn column(&self, name: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(c, _)| c == name).map(|(_, v)| v)
    }
}

enum Cleaned {
    Column(SqlValue),
    Links(Vec<i64>),
}

/// Validates `data` against `admin`'s field schema.
///
/// `creating` enforces required fields that were not submitted at all.
/// `extra_readonly` lists further fields to ignore (an inline's read-only
/// fields).
pub fn clean(
    admin: &ModelAdmin,
    data: &Map<String, Value>,
    creating: bool,
    extra_readonly: &[String],
) -> Result<CleanedData, ValidationError> {
    let readonly = |name: &str| admin.is_readonly(name) || extra_readonly.iter().any(|f| f == name);
    let data = prepopulate(admin, data, creating, &readonly);

    let mut errors = ValidationError::empty();
    let mut cleaned = CleanedData::default();

    for (key, value) in &data {
        if key.starts_with('_') {
            continue;
        }
        let Some(field) = admin.field(key) else {
            if admin.preview_named(key).is_none() {
                errors.add_field_error(key, ValidationError::new("Unknown field.", "unknown"));
            }
            continue;
        };
        if readonly(key) {
            continue;
        }
        match clean_value(field, value) {
            Ok(Cleaned::Column(v)) => {
                if let Some(column) = field.column() {
                    cleaned.columns.push((column, v));
                }
                cleaned.changed.push(key.clone());
            }
            Ok(Cleaned::Links(ids)) => {
                cleaned.many_to_many.push((key.clone(), ids));
                cleaned.changed.push(key.clone());
            }
            Err(message) => {
                let code = if message == REQUIRED { "required" } else { "invalid" };
                errors.add_field_error(key, ValidationError::new(message, code));
            }
        }
    }

    if creating {
        for field in &admin.fields {
            if field.kind == FieldKind::AutoId {
                continue;
            }
            if readonly(&field.name) {
                // Read-only text columns start out empty, the way an unset
                // model field would.
                if is_text(&field.kind) && !field.has_default {
                    cleaned.columns.push((field.name.clone(), SqlValue::Text(String::new())));
                }
            } else if field.required && !data.contains_key(&field.name) {
                errors.add_field_error(&field.name, ValidationError::new(REQUIRED, "required"));
            }
        }
    }

    errors.into_result().map(|()| cleaned)
}

fn prepopulate(
    admin: &ModelAdmin,
    data: &Map<String, Value>,
    creating: bool,
    readonly: &impl Fn(&str) -> bool,
) -> Map<String, Value> {
    let mut data = data.clone();
    for (target, sources) in &admin.prepopulated_fields {
        if readonly(target) {
            continue;
        }
        let blank = data.get(target).map_or(creating, is_blank);
        if !blank {
            continue;
        }
        let source_text: Vec<&str> = sources
            .iter()
            .filter_map(|s| data.get(s).and_then(Value::as_str))
            .collect();
        let slug = slugify(&source_text.join(" "));
        if !slug.is_empty() {
            data.insert(target.clone(), Value::String(slug));
        }
    }
    data
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

const fn is_text(kind: &FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::Char { .. }
            | FieldKind::Slug { .. }
            | FieldKind::Email { .. }
            | FieldKind::Text { .. }
            | FieldKind::Image { .. }
    )
}

fn clean_value(field: &FieldSchema, value: &Value) -> Result<Cleaned, String> {
    match &field.kind {
        FieldKind::AutoId => Err("This field cannot be set.".to_string()),
        FieldKind::Char { max_length } => {
            clean_text(field, value, Some(*max_length)).map(|s| Cleaned::Column(SqlValue::Text(s)))
        }
        FieldKind::Image { .. } => {
            clean_text(field, value, None).map(|s| Cleaned::Column(SqlValue::Text(s)))
        }
        FieldKind::Text { max_length } => {
            clean_text(field, value, *max_length).map(|s| Cleaned::Column(SqlValue::Text(s)))
        }
        FieldKind::Slug { max_length } => {
            let s = clean_text(field, value, Some(*max_length))?;
            if !s.is_empty() && !is_valid_slug(&s) {
                return Err(
                    "Enter a valid “slug” consisting of letters, numbers, underscores or hyphens."
                        .to_string(),
                );
            }
            Ok(Cleaned::Column(SqlValue::Text(s)))
        }
        FieldKind::Email { max_length } => {
            let s = clean_text(field, value, Some(*max_length))?;
            if !s.is_empty() && !is_valid_email(&s) {
                return Err("Enter a valid email address.".to_string());
            }
            Ok(Cleaned::Column(SqlValue::Text(s)))
        }
        FieldKind::PositiveInteger => {
            let n = clean_integer(value)?;
            if n < 0 {
                return Err("Ensure this value is greater than or equal to 0.".to_string());
            }
            Ok(Cleaned::Column(SqlValue::Integer(n)))
        }
        FieldKind::SmallInteger => {
            let n = clean_integer(value)?;
            if i16::try_from(n).is_err() {
                return Err("Ensure this value is between -32768 and 32767.".to_string());
            }
            Ok(Cleaned::Column(SqlValue::Integer(n)))
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(Cleaned::Column(SqlValue::Integer(i64::from(*b)))),
            other => Err(format!("“{other}” value must be either true or false.")),
        },
        FieldKind::Date => match value {
            Value::String(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| Cleaned::Column(SqlValue::Text(d.format("%Y-%m-%d").to_string())))
                .map_err(|_| "Enter a valid date.".to_string()),
            Value::Null | Value::String(_) => Err(REQUIRED.to_string()),
            _ => Err("Enter a valid date.".to_string()),
        },
        FieldKind::ForeignKey { .. } => {
            if is_blank(value) {
                return if field.required {
                    Err(REQUIRED.to_string())
                } else {
                    Ok(Cleaned::Column(SqlValue::Null))
                };
            }
            clean_integer(value)
                .map(|id| Cleaned::Column(SqlValue::Integer(id)))
                .map_err(|_| "Select a valid choice.".to_string())
        }
        FieldKind::ManyToMany { .. } => {
            let Value::Array(items) = value else {
                return Err("Enter a list of values.".to_string());
            };
            let mut ids = items
                .iter()
                .map(clean_integer)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| "Select a valid choice.".to_string())?;
            ids.sort_unstable();
            ids.dedup();
            if ids.is_empty() && field.required {
                return Err(REQUIRED.to_string());
            }
            Ok(Cleaned::Links(ids))
        }
    }
}

fn clean_text(field: &FieldSchema, value: &Value, max_length: Option<usize>) -> Result<String, String> {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err("Enter a valid value.".to_string()),
    };
    if text.is_empty() && field.required {
        return Err(REQUIRED.to_string());
    }
    if let Some(max) = max_length {
        let len = text.chars().count();
        if len > max {
            return Err(format!(
                "Ensure this value has at most {max} characters (it has {len})."
            ));
        }
    }
    Ok(text)
}

fn clean_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| "Enter a whole number.".to_string()),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| "Enter a whole number.".to_string()),
        Value::Null => Err(REQUIRED.to_string()),
        _ => Err("Enter a whole number.".to_string()),
    }
}
