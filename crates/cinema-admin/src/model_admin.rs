//! Model administration configuration.
//!
//! This module provides [`ModelAdmin`] and related types for configuring how
//! a catalog table is listed and edited through the admin API. Every setter
//! follows the builder pattern, so a registration reads as one expression.
//!
//! A `ModelAdmin` also carries the field schema of its table: the admin
//! database layer uses it to build SQL and to validate submitted data, and
//! the schema endpoint sends it to clients so they can render forms.

use std::collections::BTreeMap;

use cinema_core::utils::text::verbose_name;
use serde::Serialize;

use crate::photo::PhotoPreview;

/// The key under which the string representation of a row is returned.
pub const STR_FIELD: &str = "__str__";

/// Rows per list page unless a registration sets its own.
pub const DEFAULT_LIST_PER_PAGE: usize = 100;

/// Configuration for how a model is displayed and managed in the admin.
///
/// # Examples
///
/// ```
/// use cinema_admin::model_admin::{FieldSchema, ModelAdmin};
///
/// let admin = ModelAdmin::new("movies", "genre", "movies_genre")
///     .fields(vec![
///         FieldSchema::auto_id(),
///         FieldSchema::char("name", 100),
///         FieldSchema::slug("url", 160),
///     ])
///     .list_display(vec!["name", "url"])
///     .search_fields(vec!["name"])
///     .str_sql("name");
/// assert_eq!(admin.model_key(), "movies.genre");
/// ```
#[derive(Debug, Clone, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModelAdmin {
    /// The application label (e.g., "movies").
    pub app_label: String,
    /// The model name in lowercase (e.g., "movie").
    pub model_name: String,
    /// The database table.
    #[serde(skip)]
    pub table: String,
    /// The human-readable verbose name.
    pub verbose_name: String,
    /// The human-readable plural verbose name.
    pub verbose_name_plural: String,
    /// Columns shown in the list view.
    pub list_display: Vec<String>,
    /// Columns that link to the change view.
    pub list_display_links: Vec<String>,
    /// Fields offered as list filters.
    pub list_filter: Vec<String>,
    /// Fields searched by the `search` parameter. `fk__field` searches a
    /// column of the related table.
    pub search_fields: Vec<String>,
    /// Default ordering (prefix with "-" for descending).
    pub ordering: Vec<String>,
    /// Rows per page in the list view.
    pub list_per_page: usize,
    /// Columns editable directly from the list view.
    pub list_editable: Vec<String>,
    /// Fields shown but never written.
    pub readonly_fields: Vec<String>,
    /// Field groupings of the change view.
    pub fieldsets: Vec<Fieldset>,
    /// Child tables edited on the change view.
    pub inlines: Vec<InlineAdmin>,
    /// Names of the bulk actions offered in the list view.
    pub action_names: Vec<String>,
    /// Whether the save buttons are repeated at the top of the form.
    pub save_on_top: bool,
    /// Whether "save as new" is offered.
    pub save_as: bool,
    /// Slug fields filled from other fields when left blank.
    pub prepopulated_fields: BTreeMap<String, Vec<String>>,
    /// The table's fields.
    pub fields: Vec<FieldSchema>,
    /// Read-only `<img>` preview columns.
    pub previews: Vec<PhotoPreview>,
    /// SQL expression, evaluated against a row of `table`, giving the row's
    /// display string.
    #[serde(skip)]
    pub str_sql: String,
}

impl ModelAdmin {
    /// Creates a new `ModelAdmin` with default configuration.
    pub fn new(
        app_label: impl Into<String>,
        model_name: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        let model = model_name.into();
        let verbose = model.replace('_', " ");
        let verbose_plural = format!("{verbose}s");
        let str_sql = format!("'{} object (' || id || ')'", verbose_name(&verbose));
        Self {
            app_label: app_label.into(),
            model_name: model,
            table: table.into(),
            verbose_name: verbose,
            verbose_name_plural: verbose_plural,
            list_display: vec![STR_FIELD.to_string()],
            list_display_links: Vec::new(),
            list_filter: Vec::new(),
            search_fields: Vec::new(),
            ordering: Vec::new(),
            list_per_page: DEFAULT_LIST_PER_PAGE,
            list_editable: Vec::new(),
            readonly_fields: Vec::new(),
            fieldsets: Vec::new(),
            inlines: Vec::new(),
            action_names: vec!["delete_selected".to_string()],
            save_on_top: false,
            save_as: false,
            prepopulated_fields: BTreeMap::new(),
            fields: Vec::new(),
            previews: Vec::new(),
            str_sql,
        }
    }

    /// Sets the verbose name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Sets the plural verbose name.
    #[must_use]
    pub fn verbose_name_plural(mut self, name: impl Into<String>) -> Self {
        self.verbose_name_plural = name.into();
        self
    }

    /// Sets the columns shown in the list view.
    #[must_use]
    pub fn list_display(mut self, fields: Vec<&str>) -> Self {
        self.list_display = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the columns that link to the change view.
    #[must_use]
    pub fn list_display_links(mut self, fields: Vec<&str>) -> Self {
        self.list_display_links = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the list filters.
    #[must_use]
    pub fn list_filter(mut self, fields: Vec<&str>) -> Self {
        self.list_filter = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the fields to search over.
    #[must_use]
    pub fn search_fields(mut self, fields: Vec<&str>) -> Self {
        self.search_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the default ordering.
    #[must_use]
    pub fn ordering(mut self, fields: Vec<&str>) -> Self {
        self.ordering = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the number of rows per page.
    #[must_use]
    pub const fn list_per_page(mut self, count: usize) -> Self {
        self.list_per_page = count;
        self
    }

    /// Sets the list-editable columns.
    #[must_use]
    pub fn list_editable(mut self, fields: Vec<&str>) -> Self {
        self.list_editable = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the read-only fields.
    #[must_use]
    pub fn readonly_fields(mut self, fields: Vec<&str>) -> Self {
        self.readonly_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the fieldsets of the change view.
    #[must_use]
    pub fn fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    /// Sets the inline editors.
    #[must_use]
    pub fn inlines(mut self, inlines: Vec<InlineAdmin>) -> Self {
        self.inlines = inlines;
        self
    }

    /// Adds bulk actions after the built-in `delete_selected`.
    #[must_use]
    pub fn actions(mut self, names: Vec<&str>) -> Self {
        self.action_names.extend(names.into_iter().map(String::from));
        self
    }

    /// Enables the save-on-top buttons.
    #[must_use]
    pub const fn save_on_top(mut self, enabled: bool) -> Self {
        self.save_on_top = enabled;
        self
    }

    /// Enables "save as new".
    #[must_use]
    pub const fn save_as(mut self, enabled: bool) -> Self {
        self.save_as = enabled;
        self
    }

    /// Fills `field` from `sources` (slugified) when it is submitted blank.
    #[must_use]
    pub fn prepopulate(mut self, field: &str, sources: Vec<&str>) -> Self {
        self.prepopulated_fields.insert(
            field.to_string(),
            sources.into_iter().map(String::from).collect(),
        );
        self
    }

    /// Sets the field schema.
    #[must_use]
    pub fn fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.fields = fields;
        self
    }

    /// Adds a read-only photo preview column.
    #[must_use]
    pub fn preview(mut self, preview: PhotoPreview) -> Self {
        self.previews.push(preview);
        self
    }

    /// Sets the SQL expression used as the row's display string.
    #[must_use]
    pub fn str_sql(mut self, expr: impl Into<String>) -> Self {
        self.str_sql = expr.into();
        self
    }

    /// Returns the model key in `"app_label.model_name"` format.
    pub fn model_key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a preview column by name.
    pub fn preview_named(&self, name: &str) -> Option<&PhotoPreview> {
        self.previews.iter().find(|p| p.name == name)
    }

    /// Returns `true` if submitted values for `name` are ignored.
    pub fn is_readonly(&self, name: &str) -> bool {
        self.readonly_fields.iter().any(|f| f == name)
            || self.preview_named(name).is_some()
            || self.field(name).is_some_and(|f| f.kind == FieldKind::AutoId)
    }

    /// Returns the ordering used when the request gives none.
    pub fn effective_ordering(&self) -> Vec<String> {
        if self.ordering.is_empty() {
            vec!["-id".to_string()]
        } else {
            self.ordering.clone()
        }
    }
}

/// A grouping of fields on the change view.
///
/// Each line holds the fields rendered side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fieldset {
    /// Optional display name for this group.
    pub name: Option<String>,
    /// CSS classes (e.g., `"collapse"`).
    pub classes: Vec<String>,
    /// Rows of fields.
    pub lines: Vec<Vec<String>>,
}

impl Fieldset {
    /// Creates an untitled fieldset with no lines.
    pub const fn new() -> Self {
        Self {
            name: None,
            classes: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Creates a titled fieldset.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new()
        }
    }

    /// Appends a line of fields.
    #[must_use]
    pub fn line(mut self, fields: &[&str]) -> Self {
        self.lines
            .push(fields.iter().map(|f| (*f).to_string()).collect());
        self
    }

    /// Sets the CSS classes.
    #[must_use]
    pub fn classes(mut self, classes: Vec<&str>) -> Self {
        self.classes = classes.into_iter().map(String::from).collect();
        self
    }

    /// Iterates over every field name in the fieldset.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flatten().map(String::as_str)
    }
}

impl Default for Fieldset {
    fn default() -> Self {
        Self::new()
    }
}

/// A child table edited on its parent's change view.
#[derive(Debug, Clone, Serialize)]
pub struct InlineAdmin {
    /// The child model key, e.g. `"movies.movieshot"`.
    pub model: String,
    /// The child's foreign key field pointing at the parent.
    pub fk_name: String,
    /// The display layout.
    pub inline_type: InlineType,
    /// Number of blank rows offered for new children.
    pub extra: usize,
    /// Child fields shown but never written.
    pub readonly_fields: Vec<String>,
    /// Read-only preview columns of the child rows.
    pub previews: Vec<PhotoPreview>,
}

impl InlineAdmin {
    /// Creates a tabular inline with three extra rows.
    pub fn tabular(model: impl Into<String>, fk_name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fk_name: fk_name.into(),
            inline_type: InlineType::Tabular,
            extra: 3,
            readonly_fields: Vec::new(),
            previews: Vec::new(),
        }
    }

    /// Sets the number of extra rows.
    #[must_use]
    pub const fn extra(mut self, n: usize) -> Self {
        self.extra = n;
        self
    }

    /// Sets the read-only fields.
    #[must_use]
    pub fn readonly_fields(mut self, fields: Vec<&str>) -> Self {
        self.readonly_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Adds a preview column.
    #[must_use]
    pub fn preview(mut self, preview: PhotoPreview) -> Self {
        self.previews.push(preview);
        self
    }

    /// Returns `true` if submitted values for `name` are ignored on this inline.
    pub fn is_readonly(&self, name: &str) -> bool {
        self.readonly_fields.iter().any(|f| f == name) || self.previews.iter().any(|p| p.name == name)
    }
}

/// The visual layout of an inline editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineType {
    /// One table row per child.
    Tabular,
    /// One form block per child.
    Stacked,
}

/// A single choice within a list filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChoice {
    /// The label shown to the user.
    pub display: String,
    /// The value sent as a query parameter.
    pub value: String,
}

impl FilterChoice {
    /// Creates a new filter choice.
    pub fn new(display: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            value: value.into(),
        }
    }
}

/// The storage type of a field and its constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// The integer primary key.
    AutoId,
    /// Single-line text.
    Char { max_length: usize },
    /// Letters, digits, hyphens and underscores.
    Slug { max_length: usize },
    /// An email address.
    Email { max_length: usize },
    /// Multi-line text.
    Text { max_length: Option<usize> },
    /// An integer `>= 0`.
    PositiveInteger,
    /// An integer in `-32768..=32767`.
    SmallInteger,
    /// Stored as `0`/`1`, exchanged as JSON booleans.
    Boolean,
    /// An ISO `YYYY-MM-DD` date.
    Date,
    /// A path relative to the media root.
    Image { upload_to: String },
    /// A reference to a row of `related_model`, stored in `<name>_id`.
    ForeignKey { related_model: String },
    /// Links to rows of `related_model` through a join table.
    ManyToMany {
        related_model: String,
        #[serde(skip)]
        join_table: String,
        #[serde(skip)]
        source_column: String,
        #[serde(skip)]
        target_column: String,
    },
}

/// Schema information about a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    /// The field name.
    pub name: String,
    /// Storage type and constraints.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Whether a value must be supplied (blank not allowed).
    pub required: bool,
    /// Whether the database supplies a value when none is given.
    pub has_default: bool,
    /// Human-readable label.
    pub label: String,
}

impl FieldSchema {
    /// Creates a required field without a default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let label = verbose_name(&name);
        Self {
            name,
            kind,
            required: true,
            has_default: false,
            label,
        }
    }

    /// The `id` primary key.
    pub fn auto_id() -> Self {
        let mut field = Self::new("id", FieldKind::AutoId);
        field.label = "ID".to_string();
        field.required = false;
        field.has_default = true;
        field
    }

    /// A single-line text field.
    pub fn char(name: &str, max_length: usize) -> Self {
        Self::new(name, FieldKind::Char { max_length })
    }

    /// A slug field.
    pub fn slug(name: &str, max_length: usize) -> Self {
        Self::new(name, FieldKind::Slug { max_length })
    }

    /// An email field.
    pub fn email(name: &str, max_length: usize) -> Self {
        Self::new(name, FieldKind::Email { max_length })
    }

    /// An unbounded text field.
    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text { max_length: None })
    }

    /// A text field with a length cap.
    pub fn text_max(name: &str, max_length: usize) -> Self {
        Self::new(
            name,
            FieldKind::Text {
                max_length: Some(max_length),
            },
        )
    }

    /// A non-negative integer field.
    pub fn positive_integer(name: &str) -> Self {
        Self::new(name, FieldKind::PositiveInteger)
    }

    /// A small integer field.
    pub fn small_integer(name: &str) -> Self {
        Self::new(name, FieldKind::SmallInteger)
    }

    /// A boolean field.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// A date field.
    pub fn date(name: &str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    /// An image path field.
    pub fn image(name: &str, upload_to: &str) -> Self {
        Self::new(
            name,
            FieldKind::Image {
                upload_to: upload_to.to_string(),
            },
        )
    }

    /// A foreign key to `related_model`.
    pub fn foreign_key(name: &str, related_model: &str) -> Self {
        Self::new(
            name,
            FieldKind::ForeignKey {
                related_model: related_model.to_string(),
            },
        )
    }

    /// A many-to-many link through `join_table(source_column, target_column)`.
    pub fn many_to_many(
        name: &str,
        related_model: &str,
        join_table: &str,
        source_column: &str,
        target_column: &str,
    ) -> Self {
        Self::new(
            name,
            FieldKind::ManyToMany {
                related_model: related_model.to_string(),
                join_table: join_table.to_string(),
                source_column: source_column.to_string(),
                target_column: target_column.to_string(),
            },
        )
    }

    /// Allows the field to be blank (or null, for foreign keys).
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the field as having a database default.
    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.has_default = true;
        self.required = false;
        self
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the table column backing this field, if any.
    pub fn column(&self) -> Option<String> {
        match self.kind {
            FieldKind::ManyToMany { .. } => None,
            FieldKind::ForeignKey { .. } => Some(format!("{}_id", self.name)),
            _ => Some(self.name.clone()),
        }
    }

    /// Returns the related model key of a relational field.
    pub fn related_model(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::ForeignKey { related_model }
            | FieldKind::ManyToMany { related_model, .. } => Some(related_model),
            _ => None,
        }
    }
}

/// The registered models, keyed by `"app_label.model_name"`.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelAdmin>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) a model.
    pub fn register(&mut self, admin: ModelAdmin) {
        self.models.insert(admin.model_key(), admin);
    }

    /// Looks up a model by key.
    pub fn get(&self, key: &str) -> Option<&ModelAdmin> {
        self.models.get(key)
    }

    /// Looks up a model by app label and model name.
    pub fn lookup(&self, app_label: &str, model_name: &str) -> Option<&ModelAdmin> {
        self.models.get(&format!("{app_label}.{model_name}"))
    }

    /// Returns `true` if the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    /// Iterates over the registrations in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelAdmin> {
        self.models.values()
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_admin_new_defaults() {
        let admin = ModelAdmin::new("movies", "ratingstar", "movies_ratingstar");
        assert_eq!(admin.model_key(), "movies.ratingstar");
        assert_eq!(admin.verbose_name_plural, "ratingstars");
        assert_eq!(admin.list_display, vec![STR_FIELD]);
        assert_eq!(admin.list_per_page, 100);
        assert_eq!(admin.action_names, vec!["delete_selected"]);
        assert_eq!(admin.str_sql, "'Ratingstar object (' || id || ')'");
        assert!(!admin.save_as);
        assert_eq!(admin.effective_ordering(), vec!["-id"]);
    }

    #[test]
    fn test_model_admin_builder() {
        let admin = ModelAdmin::new("movies", "movie", "movies_movie")
            .verbose_name("movie")
            .list_display(vec!["title", "draft"])
            .list_display_links(vec!["title"])
            .list_filter(vec!["year"])
            .search_fields(vec!["title", "category__name"])
            .list_editable(vec!["draft"])
            .actions(vec!["publish", "unpublish"])
            .prepopulate("url", vec!["title"])
            .ordering(vec!["-year"])
            .save_on_top(true)
            .save_as(true);

        assert_eq!(admin.list_display, vec!["title", "draft"]);
        assert_eq!(
            admin.action_names,
            vec!["delete_selected", "publish", "unpublish"]
        );
        assert_eq!(admin.prepopulated_fields["url"], vec!["title"]);
        assert_eq!(admin.effective_ordering(), vec!["-year"]);
        assert!(admin.save_on_top);
        assert!(admin.save_as);
    }

    #[test]
    fn test_readonly_includes_previews_and_id() {
        let admin = ModelAdmin::new("movies", "actor", "movies_actor")
            .fields(vec![
                FieldSchema::auto_id(),
                FieldSchema::char("name", 100),
                FieldSchema::image("image", "actors/"),
            ])
            .readonly_fields(vec!["name"])
            .preview(PhotoPreview::new("image_preview", "image", 50, 50));

        assert!(admin.is_readonly("id"));
        assert!(admin.is_readonly("name"));
        assert!(admin.is_readonly("image_preview"));
        assert!(!admin.is_readonly("image"));
    }

    #[test]
    fn test_fieldset_lines() {
        let fs = Fieldset::named("Actors")
            .classes(vec!["collapse"])
            .line(&["actors", "directors"])
            .line(&["category"]);
        assert_eq!(fs.name.as_deref(), Some("Actors"));
        assert_eq!(fs.lines.len(), 2);
        let names: Vec<&str> = fs.field_names().collect();
        assert_eq!(names, vec!["actors", "directors", "category"]);
    }

    #[test]
    fn test_field_columns() {
        assert_eq!(
            FieldSchema::foreign_key("category", "movies.category").column(),
            Some("category_id".to_string())
        );
        let m2m = FieldSchema::many_to_many(
            "genres",
            "movies.genre",
            "movies_movie_genres",
            "movie_id",
            "genre_id",
        );
        assert_eq!(m2m.column(), None);
        assert_eq!(m2m.related_model(), Some("movies.genre"));
        assert_eq!(FieldSchema::char("title", 100).column(), Some("title".into()));
    }

    #[test]
    fn test_field_schema_serialization() {
        let field = FieldSchema::char("title", 100);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "char");
        assert_eq!(json["max_length"], 100);
        assert_eq!(json["label"], "Title");
        assert_eq!(json["required"], true);

        let m2m = FieldSchema::many_to_many("actors", "movies.actor", "j", "movie_id", "actor_id");
        let json = serde_json::to_value(&m2m).unwrap();
        assert_eq!(json["type"], "many_to_many");
        assert_eq!(json["related_model"], "movies.actor");
        assert!(json.get("join_table").is_none());
    }

    #[test]
    fn test_optional_and_default() {
        let f = FieldSchema::positive_integer("year").with_default();
        assert!(!f.required);
        assert!(f.has_default);
        let f = FieldSchema::foreign_key("parent", "movies.review").optional();
        assert!(!f.required);
        assert!(!f.has_default);
    }

    #[test]
    fn test_inline_admin() {
        let inline = InlineAdmin::tabular("movies.review", "movie")
            .extra(1)
            .readonly_fields(vec!["name", "email"]);
        assert_eq!(inline.extra, 1);
        assert_eq!(inline.inline_type, InlineType::Tabular);
        assert!(inline.is_readonly("email"));
        assert!(!inline.is_readonly("text"));
    }

    #[test]
    fn test_registry() {
        let mut registry = ModelRegistry::new();
        assert!(registry.is_empty());
        registry.register(ModelAdmin::new("movies", "genre", "movies_genre"));
        registry.register(ModelAdmin::new("movies", "actor", "movies_actor"));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("movies.genre"));
        assert!(registry.lookup("movies", "actor").is_some());
        let keys: Vec<String> = registry.iter().map(ModelAdmin::model_key).collect();
        assert_eq!(keys, vec!["movies.actor", "movies.genre"]);
    }
}
