//! End-to-end tests of the admin JSON API through the axum router.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cinema_admin::{movies, AdminSite};
use cinema_core::{AdminUserSettings, Settings};
use cinema_db::schema::migrate;
use cinema_db::Database;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const ROOT: &str = "root-token";
const VIEWER: &str = "viewer-token";

// ── Helpers ─────────────────────────────────────────────────────────

async fn app() -> Router {
    let db = Database::memory().unwrap();
    migrate(&db, false).await.unwrap();

    let mut settings = Settings::default();
    settings
        .admin_users
        .push(AdminUserSettings::superuser("root", ROOT));
    settings.admin_users.push(AdminUserSettings {
        username: "viewer".into(),
        token: VIEWER.into(),
        is_superuser: false,
        permissions: vec!["view".into()],
    });

    let mut site = AdminSite::new(settings);
    movies::register(&mut site);
    site.into_axum_router(db)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(ROOT), Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(ROOT), None).await
}

/// Creates the related rows a movie needs and returns the movie id.
async fn seed_movie(app: &Router, title: &str, draft: bool) -> i64 {
    let (_, category) = post(app, "/movies/category/", json!({"name": "Thrillers"})).await;
    let category = category["id"].as_i64();
    let (status, actor) = post(
        app,
        "/movies/actor/",
        json!({"name": format!("{title} lead"), "description": "Lead", "image": "actors/lead.jpg"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{actor}");
    let (_, genre) = post(
        app,
        "/movies/genre/",
        json!({"name": format!("{title} genre"), "description": "Genre"}),
    )
    .await;
    let (status, movie) = post(
        app,
        "/movies/movie/",
        json!({
            "title": title,
            "description": "<p>Story</p>",
            "poster": "movies/poster.jpg",
            "country": "USA",
            "year": 1995,
            "category": category,
            "directors": [actor["id"]],
            "actors": [actor["id"]],
            "genres": [genre["id"]],
            "draft": draft,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{movie}");
    movie["id"].as_i64().unwrap()
}

// ═════════════════════════════════════════════════════════════════════
// 1. Authentication and permissions
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication credentials were not provided.");

    let (status, body) = send(&app, Method::GET, "/movies/movie/", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token.");
}

#[tokio::test]
async fn test_index_lists_catalog_models() {
    let app = app().await;
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["site_header"], "Django Movies");
    let apps = body["apps"].as_array().unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0]["app_label"], "movies");
    let models = apps[0]["models"].as_array().unwrap();
    assert_eq!(models.len(), 8);
    let category = models.iter().find(|m| m["name"] == "category").unwrap();
    assert_eq!(category["verbose_name_plural"], "categories");
    assert_eq!(category["url"], "/api/admin/movies/category/");
    assert_eq!(category["perms"], json!(["view", "add", "change", "delete"]));

    let (_, viewer) = send(&app, Method::GET, "/", Some(VIEWER), None).await;
    assert_eq!(viewer["apps"][0]["models"][0]["perms"], json!(["view"]));
}

#[tokio::test]
async fn test_me_reports_current_user() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/me/", Some(VIEWER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "viewer");
    assert_eq!(body["is_superuser"], false);
    assert_eq!(body["permissions"], json!(["view"]));
}

#[tokio::test]
async fn test_viewer_cannot_write() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/movies/genre/",
        Some(VIEWER),
        Some(json!({"name": "Drama", "description": "d"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You do not have permission to add genres.");

    let (status, _) = send(&app, Method::GET, "/movies/genre/", Some(VIEWER), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unregistered_model_is_not_found() {
    let app = app().await;
    let (status, body) = get(&app, "/movies/studio/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Model 'movies.studio' is not registered");
}

// ═════════════════════════════════════════════════════════════════════
// 2. Create, validation, and conflicts
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_genre_fills_slug() {
    let app = app().await;
    let (status, body) = post(
        &app,
        "/movies/genre/",
        json!({"name": "Science Fiction", "description": "Space and time"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["__str__"], "Science Fiction");
    assert_eq!(body["object"]["url"], "science-fiction");
    assert_eq!(body["messages"][0]["level"], "success");
    assert_eq!(
        body["messages"][0]["text"],
        "The genre “Science Fiction” was added successfully."
    );
}

#[tokio::test]
async fn test_create_movie_validation_errors() {
    let app = app().await;
    let (status, body) = post(&app, "/movies/movie/", json!({"year": "soon"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please correct the errors below.");
    assert_eq!(body["fields"]["title"][0], "This field is required.");
    assert_eq!(body["fields"]["year"][0], "Enter a whole number.");
    assert!(body["fields"]["category"].is_null());
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let app = app().await;
    let body = json!({"name": "Drama", "description": "d"});
    let (status, _) = post(&app, "/movies/genre/", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/movies/genre/", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ═════════════════════════════════════════════════════════════════════
// 3. Change list: search, filters, actions, list-editable
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_change_list_search_and_filters() {
    let app = app().await;
    seed_movie(&app, "Heat", false).await;

    let (status, body) = get(&app, "/movies/movie/?search=hea").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["has_next"], false);
    let row = &body["results"][0];
    assert_eq!(row["title"], "Heat");
    assert_eq!(row["category"], "Thrillers");
    assert_eq!(row["url"], "heat");
    assert_eq!(row["draft"], false);
    assert_eq!(body["list_editable"], json!(["draft"]));
    assert_eq!(body["filters"]["category"][0]["display"], "Thrillers");
    assert_eq!(body["filters"]["year"][0]["value"], "1995");
    let actions: Vec<&str> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["delete_selected", "publish", "unpublish"]);

    let (_, body) = get(&app, "/movies/movie/?year=2001").await;
    assert_eq!(body["count"], 0);

    let (status, _) = get(&app, "/movies/movie/?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_viewer_sees_no_write_actions() {
    let app = app().await;
    let (_, body) = send(&app, Method::GET, "/movies/movie/", Some(VIEWER), None).await;
    assert_eq!(body["actions"], json!([]));
}

#[tokio::test]
async fn test_publish_and_unpublish_actions() {
    let app = app().await;
    let id = seed_movie(&app, "Heat", true).await;

    let (status, body) = post(
        &app,
        "/movies/movie/action/",
        json!({"action": "publish", "ids": [id]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["affected_count"], 1);
    assert_eq!(body["messages"][0]["text"], "1 record was updated");

    let (_, detail) = get(&app, &format!("/movies/movie/{id}/")).await;
    assert_eq!(detail["object"]["draft"], false);

    let (_, body) = post(
        &app,
        "/movies/movie/action/",
        json!({"action": "unpublish", "ids": [id, 999]}),
    )
    .await;
    assert_eq!(body["messages"][0]["text"], "1 record was updated");
}

#[tokio::test]
async fn test_action_edge_cases() {
    let app = app().await;
    let (status, body) = post(&app, "/movies/movie/action/", json!({"action": "publish"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["messages"][0]["level"], "warning");

    let (status, body) = post(&app, "/movies/movie/action/", json!({"action": "explode", "ids": [1]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action: explode");

    let (status, _) = post(&app, "/movies/genre/action/", json!({"action": "publish", "ids": [1]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/movies/movie/action/",
        Some(VIEWER),
        Some(json!({"action": "publish", "ids": [1]})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_selected_action() {
    let app = app().await;
    let (_, a) = post(&app, "/movies/ratingstar/", json!({"value": 1})).await;
    let (_, b) = post(&app, "/movies/ratingstar/", json!({"value": 2})).await;
    let (status, body) = post(
        &app,
        "/movies/ratingstar/action/",
        json!({"action": "delete_selected", "ids": [a["id"], b["id"]]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["affected_count"], 2);
    assert_eq!(body["messages"][0]["text"], "Successfully deleted 2 rating stars.");
    let (_, list) = get(&app, "/movies/ratingstar/").await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_list_editable_bulk_edit() {
    let app = app().await;
    let id = seed_movie(&app, "Heat", false).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/movies/movie/",
        Some(ROOT),
        Some(json!({"rows": [{"id": id, "draft": true}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["text"], "1 movie was changed successfully.");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/movies/movie/",
        Some(ROOT),
        Some(json!({"rows": [{"id": id, "title": "Renamed"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/movies/genre/",
        Some(ROOT),
        Some(json!({"rows": [{"id": 1, "name": "x"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Change form, inlines, history, save-as, delete
// ═════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_change_form_layout() {
    let app = app().await;
    let id = seed_movie(&app, "Heat", false).await;
    let (status, body) = get(&app, &format!("/movies/movie/{id}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"]["__str__"], "Heat");
    assert_eq!(
        body["object"]["poster_preview"],
        r#"<img src="/media/movies/poster.jpg" width="110" height="110">"#
    );
    assert_eq!(body["fieldsets"].as_array().unwrap().len(), 6);
    assert_eq!(body["fieldsets"][3]["name"], "Actors");
    assert_eq!(body["save_on_top"], true);
    assert_eq!(body["save_as"], true);
    assert!(body["readonly_fields"]
        .as_array()
        .unwrap()
        .contains(&json!("poster_preview")));
    let inlines = body["inlines"].as_array().unwrap();
    assert_eq!(inlines.len(), 2);
    assert_eq!(inlines[0]["model"], "movies.movieshot");
    assert_eq!(inlines[0]["extra"], 1);
    assert_eq!(inlines[1]["readonly_fields"], json!(["name", "email"]));
}

#[tokio::test]
async fn test_update_with_inlines_and_history() {
    let app = app().await;
    let id = seed_movie(&app, "Heat", false).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/movies/movie/{id}/"),
        Some(ROOT),
        Some(json!({
            "tagline": "A Los Angeles crime saga",
            "_inlines": {
                "movies.movieshot": [
                    {"title": "Diner", "description": "Coffee", "image": "movie_shots/diner.jpg"}
                ]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body["messages"][0]["text"],
        "The movie “Heat” was changed successfully."
    );

    let (_, detail) = get(&app, &format!("/movies/movie/{id}/")).await;
    assert_eq!(detail["inlines"][0]["rows"][0]["title"], "Diner");

    let (status, history) = get(&app, &format!("/movies/movie/{id}/history/")).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["action_flag"], "Addition");
    assert_eq!(history[1]["username"], "root");
    assert_eq!(
        history[1]["change_message"],
        "Changed tagline. Added movie shot “Diner”."
    );

    let (_, log) = get(&app, "/log/?limit=1").await;
    assert_eq!(log.as_array().unwrap().len(), 1);
    assert_eq!(log[0]["object_repr"], "Heat");
}

#[tokio::test]
async fn test_save_as_new() {
    let app = app().await;
    let id = seed_movie(&app, "Heat", false).await;

    let (status, _) = post(&app, &format!("/movies/movie/{id}/save_as/"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post(
        &app,
        &format!("/movies/movie/{id}/save_as/"),
        json!({"title": "Heat 2", "url": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_ne!(body["id"], id);
    assert_eq!(body["object"]["url"], "heat-2");
    assert_eq!(body["object"]["country"], "USA");
    assert_eq!(body["object"]["actors"].as_array().unwrap().len(), 1);

    let (_, genre) = post(&app, "/movies/genre/", json!({"name": "Noir", "description": "d"})).await;
    let (status, _) = post(
        &app,
        &format!("/movies/genre/{}/save_as/", genre["id"]),
        json!({"name": "Neo-noir"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_object() {
    let app = app().await;
    let id = seed_movie(&app, "Heat", false).await;
    let uri = format!("/movies/movie/{id}/");

    let (status, body) = send(&app, Method::DELETE, &uri, Some(ROOT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["messages"][0]["text"],
        "The movie “Heat” was deleted successfully."
    );

    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Movie with ID “{id}” doesn’t exist."));

    let (status, _) = send(&app, Method::DELETE, &uri, Some(ROOT), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_schema_endpoint() {
    let app = app().await;
    let (status, body) = get(&app, "/movies/ratingstar/schema").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verbose_name_plural"], "rating stars");
    assert_eq!(body["ordering"], json!(["-value"]));
    assert_eq!(body["list_per_page"], 100);
}
