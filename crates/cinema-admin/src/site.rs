//! Admin site registry and router generation.
//!
//! The [`AdminSite`] is the central registry where models are registered with
//! their [`ModelAdmin`] configurations and where bulk actions are installed.
//! It validates the registrations ([`AdminSite::check`]) and generates the
//! axum router serving the admin REST API.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use cinema_core::checks::CheckMessage;
use cinema_core::{CinemaError, CinemaResult, Settings};
use cinema_db::Database;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::{ActionRegistry, ActionResult, AdminAction, NOTHING_SELECTED};
use crate::api::{
    build_model_index, error_response, model_actions, ActionRequest, BulkEditRequest,
    ChangeFormResponse, ChangeListResponse, CurrentUserResponse, JsonListResponse,
    MessagesResponse, ModelSchemaResponse, SaveResponse,
};
use crate::auth::{authenticate, StaffUser};
use crate::db::{AdminDbExecutor, AdminListParams, SqliteAdminDb};
use crate::log_entry::{LogEntry, LogEntryStore};
use crate::messages::{changed_rows_message, deleted_object_message, saved_message, Message};
use crate::model_admin::{
    FieldKind, ModelAdmin, ModelRegistry, DEFAULT_LIST_PER_PAGE, STR_FIELD,
};

/// The admin site, responsible for model registration and route generation.
///
/// # Examples
///
/// ```
/// use cinema_admin::site::AdminSite;
/// use cinema_core::Settings;
///
/// let mut site = AdminSite::new(Settings::default());
/// cinema_admin::movies::register(&mut site);
/// assert!(site.is_registered("movies.movie"));
/// assert!(site.check().is_empty());
/// ```
pub struct AdminSite {
    url_prefix: String,
    registry: ModelRegistry,
    actions: ActionRegistry,
    settings: Settings,
}

impl AdminSite {
    /// Creates an empty site. The URL prefix defaults to `/api/admin`.
    pub fn new(settings: Settings) -> Self {
        Self {
            url_prefix: "/api/admin".to_string(),
            registry: ModelRegistry::new(),
            actions: ActionRegistry::new(),
            settings,
        }
    }

    /// Sets the URL prefix used in the links the API returns.
    #[must_use]
    pub fn url_prefix(mut self, prefix: &str) -> Self {
        self.url_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// Returns the URL prefix.
    pub fn url_prefix_str(&self) -> &str {
        &self.url_prefix
    }

    /// Registers a model with its admin configuration, replacing any
    /// previous registration under the same key.
    pub fn register(&mut self, admin: ModelAdmin) {
        tracing::debug!(model = %admin.model_key(), "registered admin model");
        self.registry.register(admin);
    }

    /// Installs a bulk action. Models opt in through `ModelAdmin::actions`.
    pub fn register_action(&mut self, action: Box<dyn AdminAction>) {
        self.actions.register(action);
    }

    /// Returns the `ModelAdmin` for a registered model, if any.
    pub fn get_model_admin(&self, model_key: &str) -> Option<&ModelAdmin> {
        self.registry.get(model_key)
    }

    /// Returns the registered models.
    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Returns the installed actions.
    pub const fn action_registry(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Returns whether a model is registered.
    pub fn is_registered(&self, model_key: &str) -> bool {
        self.registry.contains(model_key)
    }

    /// Returns the number of registered models.
    pub fn model_count(&self) -> usize {
        self.registry.len()
    }

    /// Validates every registration against its field schema.
    pub fn check(&self) -> Vec<CheckMessage> {
        self.registry
            .iter()
            .flat_map(|admin| check_model_admin(admin, &self.registry, &self.actions))
            .collect()
    }

    /// Generates the admin router over the `SQLite` database.
    pub fn into_axum_router(self, db: Database) -> Router {
        let registry = Arc::new(self.apply_settings());
        let executor = SqliteAdminDb::new(
            db.clone(),
            Arc::clone(&registry),
            self.settings.media_url.clone(),
        );
        Self::build_router(
            registry,
            self.actions,
            self.settings,
            self.url_prefix,
            Arc::new(executor),
            Some(LogEntryStore::new(db)),
        )
    }

    /// Generates the admin router over any executor. History endpoints
    /// return empty lists when `log_store` is `None`.
    pub fn into_router_with(
        self,
        db: Arc<dyn AdminDbExecutor>,
        log_store: Option<LogEntryStore>,
    ) -> Router {
        let registry = Arc::new(self.apply_settings());
        Self::build_router(
            registry,
            self.actions,
            self.settings,
            self.url_prefix,
            db,
            log_store,
        )
    }

    fn apply_settings(&self) -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        for admin in self.registry.iter() {
            let mut admin = admin.clone();
            if admin.list_per_page == DEFAULT_LIST_PER_PAGE {
                admin.list_per_page = self.settings.admin_list_per_page;
            }
            registry.register(admin);
        }
        registry
    }

    /// The generated routes are:
    ///
    /// - `GET /` - Registered models the user may view
    /// - `GET /me/` - Current user info
    /// - `GET /log/` - Recent log entries
    /// - `GET /{app}/{model}/schema` - Model schema
    /// - `GET /{app}/{model}/` - Change list (paginated)
    /// - `POST /{app}/{model}/` - Create an object
    /// - `PATCH /{app}/{model}/` - Save list-editable columns
    /// - `POST /{app}/{model}/action/` - Run a bulk action
    /// - `GET /{app}/{model}/{pk}/` - Change form
    /// - `PUT /{app}/{model}/{pk}/` - Update an object
    /// - `DELETE /{app}/{model}/{pk}/` - Delete an object
    /// - `GET /{app}/{model}/{pk}/history/` - Log entries of an object
    /// - `POST /{app}/{model}/{pk}/save_as/` - Save a copy as a new object
    fn build_router(
        registry: Arc<ModelRegistry>,
        actions: ActionRegistry,
        settings: Settings,
        url_prefix: String,
        db: Arc<dyn AdminDbExecutor>,
        log_store: Option<LogEntryStore>,
    ) -> Router {
        let shared = Arc::new(AdminSiteState {
            registry,
            actions,
            settings,
            url_prefix,
            db,
            log_store,
        });

        Router::new()
            .route("/", get(handle_index))
            .route("/me/", get(handle_me))
            .route("/log/", get(handle_log_recent))
            .route("/{app}/{model}/schema", get(handle_schema))
            .route(
                "/{app}/{model}/",
                get(handle_list).post(handle_create).patch(handle_bulk_edit),
            )
            .route("/{app}/{model}/action/", post(handle_action))
            .route(
                "/{app}/{model}/{pk}/",
                get(handle_detail).put(handle_update).delete(handle_delete),
            )
            .route("/{app}/{model}/{pk}/history/", get(handle_history))
            .route("/{app}/{model}/{pk}/save_as/", post(handle_save_as))
            .with_state(shared)
    }
}

impl std::fmt::Debug for AdminSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let models: Vec<String> = self.registry.iter().map(ModelAdmin::model_key).collect();
        f.debug_struct("AdminSite")
            .field("url_prefix", &self.url_prefix)
            .field("models", &models.join(", "))
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

// ── Checks ─────────────────────────────────────────────────────────

fn check_model_admin(
    admin: &ModelAdmin,
    registry: &ModelRegistry,
    actions: &ActionRegistry,
) -> Vec<CheckMessage> {
    let key = admin.model_key();
    let mut messages = Vec::new();
    let known = |name: &str| {
        name == "id" || admin.field(name).is_some() || admin.preview_named(name).is_some()
    };

    for field in &admin.fields {
        if let Some(related) = field.related_model() {
            if !registry.contains(related) {
                messages.push(CheckMessage::error(
                    "admin.E040",
                    format!("{key}.{} refers to '{related}', which is not registered.", field.name),
                    None,
                ));
            }
        }
    }
    for name in &admin.list_display {
        if name != STR_FIELD && !known(name) {
            messages.push(CheckMessage::error(
                "admin.E108",
                format!("list_display of {key} refers to '{name}', which is not a field."),
                None,
            ));
        }
    }
    for name in &admin.list_display_links {
        if !admin.list_display.contains(name) {
            messages.push(CheckMessage::error(
                "admin.E111",
                format!("list_display_links of {key} refers to '{name}', which is not in list_display."),
                None,
            ));
        }
    }
    for name in &admin.list_editable {
        let editable = admin.field(name).is_some() && !admin.is_readonly(name);
        if !editable || !admin.list_display.contains(name) {
            messages.push(CheckMessage::error(
                "admin.E121",
                format!("list_editable of {key} refers to '{name}', which is not an editable list column."),
                None,
            ));
        } else if admin.list_display_links.contains(name) {
            messages.push(CheckMessage::error(
                "admin.E123",
                format!("'{name}' of {key} cannot be in both list_editable and list_display_links."),
                None,
            ));
        }
    }
    for name in &admin.list_filter {
        if admin.field(name).is_none() {
            messages.push(CheckMessage::error(
                "admin.E116",
                format!("list_filter of {key} refers to '{name}', which is not a field."),
                None,
            ));
        }
    }
    for name in &admin.search_fields {
        if !search_field_exists(admin, registry, name) {
            messages.push(CheckMessage::error(
                "admin.E126",
                format!("search_fields of {key} refers to '{name}', which cannot be searched."),
                None,
            ));
        }
    }
    for name in &admin.ordering {
        if !known(name.trim_start_matches('-')) {
            messages.push(CheckMessage::error(
                "admin.E033",
                format!("ordering of {key} refers to '{name}', which is not a field."),
                None,
            ));
        }
    }
    for fieldset in &admin.fieldsets {
        for name in fieldset.field_names() {
            if !known(name) {
                messages.push(CheckMessage::error(
                    "admin.E035",
                    format!("fieldsets of {key} refer to '{name}', which is not a field."),
                    None,
                ));
            }
        }
    }
    for (target, sources) in &admin.prepopulated_fields {
        for name in std::iter::once(target).chain(sources) {
            if admin.field(name).is_none() {
                messages.push(CheckMessage::error(
                    "admin.E027",
                    format!("prepopulated_fields of {key} refer to '{name}', which is not a field."),
                    None,
                ));
            }
        }
    }
    for inline in &admin.inlines {
        let fk_ok = registry.get(&inline.model).is_some_and(|child| {
            child
                .field(&inline.fk_name)
                .is_some_and(|f| matches!(&f.kind, FieldKind::ForeignKey { related_model } if *related_model == key))
        });
        if !fk_ok {
            messages.push(CheckMessage::error(
                "admin.E202",
                format!(
                    "Inline '{}' of {key} has no foreign key '{}' to {key}.",
                    inline.model, inline.fk_name
                ),
                None,
            ));
        }
    }
    for name in &admin.action_names {
        if actions.get(name).is_none() {
            messages.push(CheckMessage::warning(
                "admin.W130",
                format!("Action '{name}' of {key} is not installed on the site."),
                Some("Register it with AdminSite::register_action."),
            ));
        }
    }
    messages
}

fn search_field_exists(admin: &ModelAdmin, registry: &ModelRegistry, name: &str) -> bool {
    match name.split_once("__") {
        None => admin.field(name).is_some_and(|f| f.column().is_some()),
        Some((relation, sub)) => admin
            .field(relation)
            .and_then(|f| f.related_model())
            .and_then(|related| registry.get(related))
            .is_some_and(|related| related.field(sub).is_some_and(|f| f.column().is_some())),
    }
}

// ── Handlers ───────────────────────────────────────────────────────

/// Shared state for axum handlers.
struct AdminSiteState {
    registry: Arc<ModelRegistry>,
    actions: ActionRegistry,
    settings: Settings,
    url_prefix: String,
    db: Arc<dyn AdminDbExecutor>,
    log_store: Option<LogEntryStore>,
}

impl AdminSiteState {
    /// Authenticates the request and resolves the model, checking `permission`.
    fn authorize(
        &self,
        headers: &HeaderMap,
        app: &str,
        model: &str,
        permission: &str,
    ) -> CinemaResult<(StaffUser, &ModelAdmin)> {
        let user = authenticate(&self.settings, headers)?;
        let admin = self.registry.lookup(app, model).ok_or_else(|| {
            CinemaError::NotFound(format!("Model '{app}.{model}' is not registered"))
        })?;
        user.require(admin, permission)?;
        Ok((user, admin))
    }

    async fn save_response(
        &self,
        admin: &ModelAdmin,
        pk: i64,
        repr: &str,
        created: bool,
    ) -> CinemaResult<SaveResponse> {
        let object = self.db.get_object(admin, pk).await?;
        Ok(SaveResponse {
            id: pk,
            repr: repr.to_string(),
            object,
            messages: vec![saved_message(&admin.verbose_name, repr, created)],
        })
    }
}

type SharedState = State<Arc<AdminSiteState>>;

fn respond<T: Serialize>(status: StatusCode, result: CinemaResult<T>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn handle_index(State(state): SharedState, headers: HeaderMap) -> Response {
    let result = authenticate(&state.settings, &headers).map(|user| {
        build_model_index(
            &state.registry,
            &user,
            &state.url_prefix,
            &state.settings.site_header,
            &state.settings.site_title,
        )
    });
    respond(StatusCode::OK, result)
}

async fn handle_me(State(state): SharedState, headers: HeaderMap) -> Response {
    let result =
        authenticate(&state.settings, &headers).map(|user| CurrentUserResponse::from(&user));
    respond(StatusCode::OK, result)
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    limit: Option<usize>,
}

async fn handle_log_recent(
    State(state): SharedState,
    headers: HeaderMap,
    Query(query): Query<LogQuery>,
) -> Response {
    let result = async {
        let user = authenticate(&state.settings, &headers)?;
        let Some(store) = &state.log_store else {
            return Ok(Vec::new());
        };
        let entries = store.recent(query.limit.unwrap_or(10).min(100)).await?;
        Ok::<_, CinemaError>(entries
            .into_iter()
            .filter(|entry| {
                user.0
                    .has_permission(&entry.app_label, &entry.model_name, "view")
            })
            .collect::<Vec<LogEntry>>())
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_schema(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
) -> Response {
    let result = state
        .authorize(&headers, &app, &model, "view")
        .map(|(_, admin)| ModelSchemaResponse::from_model_admin(admin, &state.actions));
    respond(StatusCode::OK, result)
}

async fn handle_list(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "view")?;
        let params = AdminListParams::from_query(query)?;
        let page = state.db.list_objects(admin, &params).await?;
        let filters = state.db.filter_choices(admin).await?;
        let actions = model_actions(admin, &state.actions)
            .into_iter()
            .filter(|info| {
                state.actions.get(&info.name).is_some_and(|action| {
                    action
                        .allowed_permissions()
                        .iter()
                        .all(|perm| user.has_permission(admin, perm))
                })
            })
            .collect();
        Ok::<_, CinemaError>(ChangeListResponse {
            page: JsonListResponse::from(page),
            list_display: admin.list_display.clone(),
            list_display_links: admin.list_display_links.clone(),
            list_editable: admin.list_editable.clone(),
            filters,
            actions,
        })
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_create(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    axum::Json(body): axum::Json<Map<String, Value>>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "add")?;
        let outcome = state.db.create_object(admin, &body, user.username()).await?;
        state
            .save_response(admin, outcome.pk, &outcome.repr, true)
            .await
    };
    respond(StatusCode::CREATED, result.await)
}

async fn handle_bulk_edit(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    axum::Json(body): axum::Json<BulkEditRequest>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "change")?;
        if admin.list_editable.is_empty() {
            return Err(CinemaError::BadRequest(format!(
                "{} has no list-editable fields",
                admin.verbose_name_plural
            )));
        }
        let rows = body
            .rows
            .into_iter()
            .map(|row| {
                let pk = row.get("id").and_then(Value::as_i64).ok_or_else(|| {
                    CinemaError::BadRequest("Every row needs an integer \"id\"".into())
                })?;
                Ok((pk, row))
            })
            .collect::<CinemaResult<Vec<_>>>()?;
        let changed = state.db.bulk_edit(admin, rows, user.username()).await?;
        Ok::<_, CinemaError>(MessagesResponse {
            affected_count: changed,
            messages: vec![changed_rows_message(
                changed,
                &admin.verbose_name,
                &admin.verbose_name_plural,
            )],
        })
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_action(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model)): Path<(String, String)>,
    axum::Json(body): axum::Json<ActionRequest>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "view")?;
        let action = admin
            .action_names
            .iter()
            .any(|name| *name == body.action)
            .then(|| state.actions.get(&body.action))
            .flatten()
            .ok_or_else(|| CinemaError::BadRequest(format!("Unknown action: {}", body.action)))?;
        for permission in action.allowed_permissions() {
            user.require(admin, permission)?;
        }
        if body.ids.is_empty() {
            return Ok(ActionResult::failure(Message::warning(NOTHING_SELECTED)));
        }
        tracing::info!(
            user = user.username(),
            model = %admin.model_key(),
            action = action.name(),
            selected = body.ids.len(),
            "running admin action"
        );
        action
            .execute(state.db.as_ref(), admin, &body.ids, user.username())
            .await
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_detail(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, i64)>,
) -> Response {
    let result = async {
        let (_, admin) = state.authorize(&headers, &app, &model, "view")?;
        let object = state.db.get_object(admin, pk).await?;
        let inline_rows = state.db.inline_rows(admin, pk).await?;
        Ok::<_, CinemaError>(ChangeFormResponse::new(
            admin,
            &state.registry,
            object,
            inline_rows,
        ))
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_update(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, i64)>,
    axum::Json(body): axum::Json<Map<String, Value>>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "change")?;
        let outcome = state
            .db
            .update_object(admin, pk, &body, user.username())
            .await?;
        state
            .save_response(admin, outcome.pk, &outcome.repr, false)
            .await
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_delete(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, i64)>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "delete")?;
        let object = state.db.get_object(admin, pk).await?;
        let repr = object
            .get(STR_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let deleted = state.db.delete_objects(admin, &[pk], user.username()).await?;
        Ok::<_, CinemaError>(MessagesResponse {
            affected_count: deleted,
            messages: vec![deleted_object_message(&admin.verbose_name, &repr)],
        })
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_history(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, i64)>,
) -> Response {
    let result = async {
        let (_, admin) = state.authorize(&headers, &app, &model, "view")?;
        match &state.log_store {
            Some(store) => {
                store
                    .for_object(&admin.app_label, &admin.model_name, pk)
                    .await
            }
            None => Ok(Vec::new()),
        }
    };
    respond(StatusCode::OK, result.await)
}

async fn handle_save_as(
    State(state): SharedState,
    headers: HeaderMap,
    Path((app, model, pk)): Path<(String, String, i64)>,
    axum::Json(overrides): axum::Json<Map<String, Value>>,
) -> Response {
    let result = async {
        let (user, admin) = state.authorize(&headers, &app, &model, "add")?;
        if !admin.save_as {
            return Err(CinemaError::BadRequest(format!(
                "\"Save as new\" is not enabled for {}",
                admin.verbose_name_plural
            )));
        }
        let mut data = state.db.get_object(admin, pk).await?;
        data.retain(|name, _| admin.field(name).is_some() && !admin.is_readonly(name));
        data.extend(overrides.into_iter().filter(|(name, _)| name != "_inlines"));
        let outcome = state.db.create_object(admin, &data, user.username()).await?;
        state
            .save_response(admin, outcome.pk, &outcome.repr, true)
            .await
    };
    respond(StatusCode::CREATED, result.await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movies;
    use crate::photo::PhotoPreview;

    fn site() -> AdminSite {
        let mut site = AdminSite::new(Settings::default());
        movies::register(&mut site);
        site
    }

    #[test]
    fn test_catalog_site_passes_checks() {
        let site = site();
        assert_eq!(site.model_count(), 8);
        let messages = site.check();
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn test_check_reports_unknown_list_display() {
        let mut site = site();
        site.register(movies::genre_admin().list_display(vec!["name", "nope"]));
        let messages = site.check();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "admin.E108");
    }

    #[test]
    fn test_check_reports_bad_list_editable() {
        let mut site = site();
        site.register(
            movies::actor_admin()
                .list_editable(vec!["image_preview", "age"])
                .preview(PhotoPreview::new("thumb", "image", 10, 10)),
        );
        let ids: Vec<&str> = site.check().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["admin.E121"]);
    }

    #[test]
    fn test_check_reports_uninstalled_action() {
        let mut site = AdminSite::new(Settings::default());
        for admin in movies::admins() {
            site.register(admin);
        }
        let messages = site.check();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.id == "admin.W130" && !m.is_error()));
    }

    #[test]
    fn test_check_reports_bad_inline_and_search() {
        let mut site = site();
        site.register(
            movies::genre_admin()
                .search_fields(vec!["name", "url__name"])
                .inlines(vec![crate::model_admin::InlineAdmin::tabular(
                    "movies.movieshot",
                    "movie",
                )]),
        );
        let ids: Vec<&str> = site.check().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["admin.E126", "admin.E202"]);
    }

    #[test]
    fn test_list_per_page_from_settings() {
        let mut settings = Settings::default();
        settings.admin_list_per_page = 25;
        let mut site = AdminSite::new(settings);
        site.register(movies::genre_admin());
        site.register(movies::category_admin().list_per_page(10));
        let registry = site.apply_settings();
        assert_eq!(registry.get("movies.genre").unwrap().list_per_page, 25);
        assert_eq!(registry.get("movies.category").unwrap().list_per_page, 10);
    }

    #[test]
    fn test_site_debug() {
        let debug = format!("{:?}", site().url_prefix("/admin-api/"));
        assert!(debug.contains("movies.movie"));
        assert!(debug.contains("/admin-api"));
    }
}
