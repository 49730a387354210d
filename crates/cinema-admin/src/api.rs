//! JSON types exchanged by the admin API.
//!
//! Responses are plain serde structs; [`error_response`] turns a
//! [`CinemaError`] into the `{"error": ...}` body every endpoint uses on
//! failure.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cinema_core::CinemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::ActionRegistry;
use crate::auth::StaffUser;
use crate::db::{InlineRows, ListPage};
use crate::messages::Message;
use crate::model_admin::{
    FieldSchema, Fieldset, FilterChoice, InlineAdmin, InlineType, ModelAdmin, ModelRegistry,
};
use crate::photo::PhotoPreview;

/// Converts an error into a JSON response with the matching status code.
///
/// Validation failures carry the per-field messages under `fields`.
pub fn error_response(err: &CinemaError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "admin request failed");
    }
    let body = match err {
        CinemaError::ValidationError(validation) => {
            let detail = validation.to_json();
            serde_json::json!({
                "error": "Please correct the errors below.",
                "message": detail["message"],
                "fields": detail["fields"],
            })
        }
        CinemaError::NotFound(msg)
        | CinemaError::DoesNotExist(msg)
        | CinemaError::BadRequest(msg)
        | CinemaError::Unauthorized(msg)
        | CinemaError::PermissionDenied(msg) => serde_json::json!({ "error": msg }),
        _ if status.is_server_error() => serde_json::json!({ "error": status.canonical_reason() }),
        other => serde_json::json!({ "error": other.to_string() }),
    };
    (status, axum::Json(body)).into_response()
}

/// A paginated JSON response for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonListResponse {
    /// The rows of the current page.
    pub results: Vec<Value>,
    /// Total number of matching rows (across all pages).
    pub count: usize,
    /// The current page number (1-indexed).
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl JsonListResponse {
    /// Builds the response, computing the page metadata.
    pub fn new(results: Vec<Value>, count: usize, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = count.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);
        Self {
            results,
            count,
            page,
            page_size,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

impl From<ListPage> for JsonListResponse {
    fn from(page: ListPage) -> Self {
        Self::new(page.rows, page.count, page.page, page.page_size)
    }
}

/// A bulk action as offered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub name: String,
    pub description: String,
}

/// Returns the actions of `admin` that are registered on the site.
pub fn model_actions(admin: &ModelAdmin, registry: &ActionRegistry) -> Vec<ActionInfo> {
    admin
        .action_names
        .iter()
        .filter_map(|name| registry.get(name))
        .map(|action| ActionInfo {
            name: action.name().to_string(),
            description: action.description().to_string(),
        })
        .collect()
}

/// The list view: one page of rows plus the filter sidebar and actions.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeListResponse {
    #[serde(flatten)]
    pub page: JsonListResponse,
    pub list_display: Vec<String>,
    pub list_display_links: Vec<String>,
    pub list_editable: Vec<String>,
    pub filters: BTreeMap<String, Vec<FilterChoice>>,
    pub actions: Vec<ActionInfo>,
}

/// Response for the model index endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelIndexResponse {
    pub site_header: String,
    pub site_title: String,
    /// The registered models grouped by app label.
    pub apps: Vec<AppModels>,
}

/// Models grouped under an application label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppModels {
    pub app_label: String,
    pub models: Vec<ModelInfo>,
}

/// Summary information about a registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub verbose_name: String,
    pub verbose_name_plural: String,
    /// The API URL of the model's list view.
    pub url: String,
    /// The permissions the current user holds on the model.
    pub perms: Vec<String>,
}

/// Builds the model index, listing only the models `user` may view.
pub fn build_model_index(
    registry: &ModelRegistry,
    user: &StaffUser,
    url_prefix: &str,
    site_header: &str,
    site_title: &str,
) -> ModelIndexResponse {
    let mut apps_map: BTreeMap<String, Vec<ModelInfo>> = BTreeMap::new();
    for admin in registry.iter() {
        let perms = user.permissions_for(admin);
        if !perms.contains(&"view") {
            continue;
        }
        apps_map
            .entry(admin.app_label.clone())
            .or_default()
            .push(ModelInfo {
                name: admin.model_name.clone(),
                verbose_name: admin.verbose_name.clone(),
                verbose_name_plural: admin.verbose_name_plural.clone(),
                url: format!("{url_prefix}/{}/{}/", admin.app_label, admin.model_name),
                perms: perms.into_iter().map(String::from).collect(),
            });
    }
    ModelIndexResponse {
        site_header: site_header.to_string(),
        site_title: site_title.to_string(),
        apps: apps_map
            .into_iter()
            .map(|(app_label, models)| AppModels { app_label, models })
            .collect(),
    }
}

/// Schema of a model, used by clients to render lists and forms.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSchemaResponse {
    pub app_label: String,
    pub model_name: String,
    pub verbose_name: String,
    pub verbose_name_plural: String,
    pub fields: Vec<FieldSchema>,
    pub previews: Vec<PhotoPreview>,
    pub list_display: Vec<String>,
    pub list_display_links: Vec<String>,
    pub list_filter: Vec<String>,
    pub list_editable: Vec<String>,
    pub search_fields: Vec<String>,
    pub ordering: Vec<String>,
    pub readonly_fields: Vec<String>,
    pub prepopulated_fields: BTreeMap<String, Vec<String>>,
    pub actions: Vec<ActionInfo>,
    pub list_per_page: usize,
}

impl ModelSchemaResponse {
    /// Creates a schema response from a `ModelAdmin`.
    pub fn from_model_admin(admin: &ModelAdmin, actions: &ActionRegistry) -> Self {
        Self {
            app_label: admin.app_label.clone(),
            model_name: admin.model_name.clone(),
            verbose_name: admin.verbose_name.clone(),
            verbose_name_plural: admin.verbose_name_plural.clone(),
            fields: admin.fields.clone(),
            previews: admin.previews.clone(),
            list_display: admin.list_display.clone(),
            list_display_links: admin.list_display_links.clone(),
            list_filter: admin.list_filter.clone(),
            list_editable: admin.list_editable.clone(),
            search_fields: admin.search_fields.clone(),
            ordering: admin.effective_ordering(),
            readonly_fields: admin.readonly_fields.clone(),
            prepopulated_fields: admin.prepopulated_fields.clone(),
            actions: model_actions(admin, actions),
            list_per_page: admin.list_per_page,
        }
    }
}

/// One inline editor on the change view.
#[derive(Debug, Clone, Serialize)]
pub struct InlineFormResponse {
    pub model: String,
    pub verbose_name_plural: String,
    pub fk_name: String,
    pub inline_type: InlineType,
    pub extra: usize,
    pub fields: Vec<FieldSchema>,
    pub readonly_fields: Vec<String>,
    pub previews: Vec<PhotoPreview>,
    pub rows: Vec<Map<String, Value>>,
}

impl InlineFormResponse {
    /// Combines an inline's configuration with its child rows.
    pub fn new(inline: &InlineAdmin, child: &ModelAdmin, rows: Vec<Map<String, Value>>) -> Self {
        let mut previews = inline.previews.clone();
        previews.extend(child.previews.iter().cloned());
        Self {
            model: inline.model.clone(),
            verbose_name_plural: child.verbose_name_plural.clone(),
            fk_name: inline.fk_name.clone(),
            inline_type: inline.inline_type,
            extra: inline.extra,
            fields: child
                .fields
                .iter()
                .filter(|f| f.name != inline.fk_name)
                .cloned()
                .collect(),
            readonly_fields: inline.readonly_fields.clone(),
            previews,
            rows,
        }
    }
}

/// The change view of one object.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeFormResponse {
    pub object: Map<String, Value>,
    pub fieldsets: Vec<Fieldset>,
    pub readonly_fields: Vec<String>,
    pub prepopulated_fields: BTreeMap<String, Vec<String>>,
    pub inlines: Vec<InlineFormResponse>,
    pub save_on_top: bool,
    pub save_as: bool,
}

impl ChangeFormResponse {
    /// Builds the change view. Inline rows are matched to `admin.inlines` by model key.
    pub fn new(
        admin: &ModelAdmin,
        registry: &ModelRegistry,
        object: Map<String, Value>,
        inline_rows: Vec<InlineRows>,
    ) -> Self {
        let mut rows_by_model: BTreeMap<String, Vec<Map<String, Value>>> = inline_rows
            .into_iter()
            .map(|inline| (inline.model, inline.rows))
            .collect();
        let inlines = admin
            .inlines
            .iter()
            .filter_map(|inline| {
                let child = registry.get(&inline.model)?;
                let rows = rows_by_model.remove(&inline.model).unwrap_or_default();
                Some(InlineFormResponse::new(inline, child, rows))
            })
            .collect();
        let mut readonly_fields = admin.readonly_fields.clone();
        readonly_fields.extend(admin.previews.iter().map(|p| p.name.clone()));
        Self {
            object,
            fieldsets: admin.fieldsets.clone(),
            readonly_fields,
            prepopulated_fields: admin.prepopulated_fields.clone(),
            inlines,
            save_on_top: admin.save_on_top,
            save_as: admin.save_as,
        }
    }
}

/// Response of a create, update, or "save as new".
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub id: i64,
    #[serde(rename = "__str__")]
    pub repr: String,
    pub object: Map<String, Value>,
    pub messages: Vec<Message>,
}

/// Response of a bulk edit or delete.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesResponse {
    pub affected_count: usize,
    pub messages: Vec<Message>,
}

/// Current user info for the `/me/` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub username: String,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
}

impl From<&StaffUser> for CurrentUserResponse {
    fn from(user: &StaffUser) -> Self {
        Self {
            username: user.0.username.clone(),
            is_superuser: user.0.is_superuser,
            permissions: user.0.permissions.clone(),
        }
    }
}

/// Body of the action endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// Body of the list-editable endpoint: `{"rows": [{"id": 1, "draft": true}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEditRequest {
    pub rows: Vec<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use cinema_core::{AdminUserSettings, ValidationError};
    use http_body_util::BodyExt;

    use super::*;

    fn superuser() -> StaffUser {
        StaffUser(AdminUserSettings::superuser("root", "t"))
    }

    #[test]
    fn test_json_list_response_first_page() {
        let rows = vec![serde_json::json!({"id": 1}), serde_json::json!({"id": 2})];
        let response = JsonListResponse::new(rows, 5, 1, 2);
        assert_eq!(response.total_pages, 3);
        assert!(response.has_next);
        assert!(!response.has_previous);
    }

    #[test]
    fn test_json_list_response_empty() {
        let response = JsonListResponse::new(Vec::new(), 0, 4, 0);
        assert_eq!(response.page, 1);
        assert_eq!(response.page_size, 1);
        assert_eq!(response.total_pages, 1);
        assert!(!response.has_next);
    }

    #[test]
    fn test_json_list_response_serialization() {
        let response = JsonListResponse::new(vec![serde_json::json!({"id": 1})], 1, 1, 10);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"count\":1"));
        assert!(json.contains("\"has_previous\":false"));
    }

    #[test]
    fn test_model_index_filters_by_view_permission() {
        let mut registry = ModelRegistry::new();
        registry.register(ModelAdmin::new("movies", "movie", "movies_movie"));
        registry.register(ModelAdmin::new("movies", "genre", "movies_genre"));
        registry.register(ModelAdmin::new("sites", "site", "sites_site"));

        let index = build_model_index(&registry, &superuser(), "/api/admin", "H", "T");
        assert_eq!(index.apps.len(), 2);
        assert_eq!(index.apps[0].app_label, "movies");
        assert_eq!(index.apps[0].models.len(), 2);
        assert_eq!(index.apps[0].models[0].url, "/api/admin/movies/genre/");

        let reviewer = StaffUser(AdminUserSettings {
            username: "reviewer".into(),
            token: "r".into(),
            is_superuser: false,
            permissions: vec!["movies.view_movie".into()],
        });
        let index = build_model_index(&registry, &reviewer, "/api/admin", "H", "T");
        assert_eq!(index.apps.len(), 1);
        assert_eq!(index.apps[0].models[0].name, "movie");
        assert_eq!(index.apps[0].models[0].perms, vec!["view"]);
    }

    #[test]
    fn test_model_schema_lists_registered_actions() {
        let admin = ModelAdmin::new("movies", "movie", "movies_movie")
            .actions(vec!["publish", "missing"])
            .search_fields(vec!["title"]);
        let mut actions = ActionRegistry::new();
        actions.register(Box::new(crate::actions::SetDraftAction::publish()));
        let schema = ModelSchemaResponse::from_model_admin(&admin, &actions);
        let names: Vec<&str> = schema.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["delete_selected", "publish"]);
        assert_eq!(schema.ordering, vec!["-id"]);
        assert_eq!(schema.search_fields, vec!["title"]);
    }

    #[test]
    fn test_current_user_response() {
        let json = serde_json::to_string(&CurrentUserResponse::from(&superuser())).unwrap();
        assert!(json.contains("\"username\":\"root\""));
        assert!(json.contains("\"is_superuser\":true"));
    }

    #[tokio::test]
    async fn test_error_response_validation_fields() {
        let mut err = ValidationError::empty();
        err.add_field_error("title", ValidationError::new("This field is required.", "required"));
        let response = error_response(&CinemaError::ValidationError(err));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["fields"]["title"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_error_response_hides_internal_details() {
        let response = error_response(&CinemaError::DatabaseError("disk I/O".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal Server Error");
    }
}
