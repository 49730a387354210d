//! Request handlers for the public site.
//!
//! HTML handlers render through [`Templates`] and turn any [`CinemaError`]
//! into `error.html` with the error's status. The JSON endpoints answer
//! errors with an `{"error": ...}` body instead.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{ConnectInfo, Form, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use cinema_core::utils::text::is_valid_slug;
use cinema_core::{CinemaError, CinemaResult, Settings};
use cinema_db::models::{Actor, Movie, MovieCard};
use cinema_db::{Catalog, Database, MovieFilter};
use serde::Serialize;
use serde_json::{json, Value};
use tera::Context;

use crate::forms::{RatingForm, ReviewForm};
use crate::pagination::Paginator;
use crate::querydict::QueryDict;
use crate::templates::Templates;
use crate::urls::reverse;

/// Shared state of the public handlers.
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub catalog: Catalog,
    pub templates: Templates,
}

impl AppState {
    /// Builds the state, compiling templates from `settings.template_dirs`.
    ///
    /// # Errors
    ///
    /// Returns an error if a template override cannot be read or compiled.
    pub fn new(settings: Settings, db: Database) -> CinemaResult<Self> {
        let templates = Templates::new(&settings.template_dirs)?;
        Ok(Self {
            settings,
            catalog: Catalog::new(db),
            templates,
        })
    }

    /// The context every page starts from: site settings, links and the sidebar.
    async fn base_context(&self) -> CinemaResult<Context> {
        let sidebar = self.catalog.sidebar().await?;
        let mut ctx = Context::new();
        ctx.insert("site_title", &self.settings.site_title);
        ctx.insert("static_url", &self.settings.static_url);
        ctx.insert("media_url", &self.settings.media_url);
        ctx.insert(
            "urls",
            &json!({
                "movie_list": reverse("movie_list", &[])?,
                "filter": reverse("filter", &[])?,
                "add_rating": reverse("add_rating", &[])?,
            }),
        );
        ctx.insert(
            "sidebar",
            &json!({
                "genres": sidebar.genres,
                "years": sidebar.years,
                "categories": sidebar.categories,
                "last_movies": linked_movies(&sidebar.last_movies)?,
            }),
        );
        ctx.insert("selected_years", &Vec::<i64>::new());
        ctx.insert("selected_genres", &Vec::<i64>::new());
        Ok(ctx)
    }
}

/// Serializes `item` with an extra `absolute_url` key.
fn with_url<T: Serialize>(item: &T, url: String) -> CinemaResult<Value> {
    let mut value = serde_json::to_value(item)?;
    if let Value::Object(map) = &mut value {
        map.insert("absolute_url".to_string(), Value::String(url));
    }
    Ok(value)
}

fn linked_movies(movies: &[Movie]) -> CinemaResult<Vec<Value>> {
    movies
        .iter()
        .map(|m| with_url(m, m.get_absolute_url()))
        .collect()
}

fn linked_actors(actors: &[Actor]) -> CinemaResult<Vec<Value>> {
    actors
        .iter()
        .map(|a| with_url(a, a.get_absolute_url()))
        .collect()
}

fn status_of(err: &CinemaError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn log_failure(err: &CinemaError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!(error = %err, status = status.as_u16(), "request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
    }
}

/// Renders `error.html` for `err`. Details are only shown in debug mode.
fn error_page(state: &AppState, err: &CinemaError) -> Response {
    let status = status_of(err);
    log_failure(err, status);

    let message = if state.settings.debug {
        err.to_string()
    } else {
        status.canonical_reason().unwrap_or("Error").to_string()
    };
    let mut ctx = Context::new();
    ctx.insert("site_title", &state.settings.site_title);
    ctx.insert("status", &status.as_u16());
    ctx.insert("message", &message);

    match state.templates.render("error.html", &ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(render_err) => {
            tracing::error!(error = %render_err, "error page failed to render");
            (status, message).into_response()
        }
    }
}

fn html_response(state: &AppState, result: CinemaResult<String>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_page(state, &err),
    }
}

/// Answers `err` with a JSON body; validation errors carry their fields.
fn json_error(err: &CinemaError) -> Response {
    let status = status_of(err);
    log_failure(err, status);
    let body = match err {
        CinemaError::ValidationError(validation) => json!({
            "error": validation.to_string(),
            "fields": validation.to_json()["fields"],
        }),
        other => json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
}

fn parse_ids(query: &QueryDict, key: &str) -> CinemaResult<Vec<i64>> {
    query
        .get_list(key)
        .into_iter()
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| CinemaError::BadRequest(format!("Invalid {key}: '{raw}'")))
        })
        .collect()
}

/// Reads the `year` and `genre` selections.
fn parse_filter(query: &QueryDict) -> CinemaResult<MovieFilter> {
    Ok(MovieFilter {
        years: parse_ids(query, "year")?,
        genres: parse_ids(query, "genre")?,
    })
}

/// Returns the client address: the first `X-Forwarded-For` entry when it
/// holds an IP address, otherwise the peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .unwrap_or_else(|| peer.ip())
        .to_string()
}

// ── Movie list ──────────────────────────────────────────────────────

/// `GET /` - published movies, a page at a time.
pub async fn movie_list(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = QueryDict::parse(query.as_deref().unwrap_or_default());
    let result = render_movie_list(&state, &query).await;
    html_response(&state, result)
}

async fn render_movie_list(state: &AppState, query: &QueryDict) -> CinemaResult<String> {
    let count = state.catalog.count_published().await?;
    let page = Paginator::new(count, state.settings.movies_per_page)
        .page_from_query(query.get("page"))?;
    let movies = state
        .catalog
        .published_movies(page.offset(), page.per_page)
        .await?;

    let mut ctx = state.base_context().await?;
    ctx.insert("movies", &linked_movies(&movies)?);
    ctx.insert("page", &page);
    ctx.insert("query_prefix", "");
    state.templates.render("movie_list.html", &ctx)
}

// ── Filter ──────────────────────────────────────────────────────────

/// `GET /filter/?year=..&genre=..` - movies matching any selected year or genre.
pub async fn filter_movies(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = QueryDict::parse(query.as_deref().unwrap_or_default());
    let result = render_filter(&state, &query).await;
    html_response(&state, result)
}

async fn render_filter(state: &AppState, query: &QueryDict) -> CinemaResult<String> {
    let filter = parse_filter(query)?;
    let count = state.catalog.count_filtered(&filter).await?;
    let page = Paginator::new(count, state.settings.filter_per_page)
        .page_from_query(query.get("page"))?;
    let movies = state
        .catalog
        .filter_movies(&filter, page.offset(), page.per_page)
        .await?;

    let mut ctx = state.base_context().await?;
    ctx.insert("movies", &linked_movies(&movies)?);
    ctx.insert("page", &page);
    ctx.insert(
        "query_prefix",
        &format!("{}{}", query.prefix_for("year"), query.prefix_for("genre")),
    );
    ctx.insert("selected_years", &filter.years);
    ctx.insert("selected_genres", &filter.genres);
    state.templates.render("movie_list.html", &ctx)
}

/// `GET /json-filter/` - the filter as `{"movies": [...]}`.
pub async fn json_filter(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = QueryDict::parse(query.as_deref().unwrap_or_default());
    match movie_cards(&state, &query).await {
        Ok(cards) => Json(json!({ "movies": cards })).into_response(),
        Err(err) => json_error(&err),
    }
}

async fn movie_cards(state: &AppState, query: &QueryDict) -> CinemaResult<Vec<MovieCard>> {
    let filter = parse_filter(query)?;
    let movies = state.catalog.filter_movies_all(&filter).await?;
    Ok(movies.iter().map(MovieCard::from).collect())
}

// ── Detail pages ────────────────────────────────────────────────────

/// `GET /{slug}/` - a published movie with its people, stills and reviews.
pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Response {
    let result = render_movie_detail(&state, &slug).await;
    html_response(&state, result)
}

async fn render_movie_detail(state: &AppState, slug: &str) -> CinemaResult<String> {
    if !is_valid_slug(slug) {
        return Err(CinemaError::NotFound(format!("No movie found matching '{slug}'")));
    }
    let detail = state.catalog.movie_by_slug(slug).await?;
    let stars = state.catalog.rating_stars().await?;
    let movie_id = detail.movie.id.to_string();

    let mut ctx = state.base_context().await?;
    ctx.insert(
        "movie",
        &with_url(&detail.movie, detail.movie.get_absolute_url())?,
    );
    ctx.insert("category", &detail.category);
    ctx.insert("genres", &detail.genres);
    ctx.insert("directors", &linked_actors(&detail.directors)?);
    ctx.insert("actors", &linked_actors(&detail.actors)?);
    ctx.insert("shots", &detail.shots);
    ctx.insert("reviews", &detail.reviews);
    ctx.insert("stars", &stars);
    ctx.insert("review_action", &reverse("add_review", &[&movie_id])?);
    state.templates.render("movie_detail.html", &ctx)
}

/// `GET /actor/{name}/` - an actor or director and their published films.
pub async fn actor_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let result = render_actor(&state, &name).await;
    html_response(&state, result)
}

async fn render_actor(state: &AppState, name: &str) -> CinemaResult<String> {
    let detail = state.catalog.actor_by_name(name).await?;
    let mut ctx = state.base_context().await?;
    ctx.insert(
        "actor",
        &with_url(&detail.actor, detail.actor.get_absolute_url())?,
    );
    ctx.insert("acted_in", &linked_movies(&detail.acted_in)?);
    ctx.insert("directed", &linked_movies(&detail.directed)?);
    state.templates.render("actor.html", &ctx)
}

/// Fallback for paths no route matches.
pub async fn page_not_found(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    error_page(
        &state,
        &CinemaError::NotFound(format!("No page matches '{}'", uri.path())),
    )
}

// ── Forms ───────────────────────────────────────────────────────────

/// An unreadable body counts as an empty form, so it fails `clean` like one.
fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable form body");
            T::default()
        }
    }
}

/// `POST /review/{pk}/` - saves a valid review and redirects back to the movie.
///
/// An invalid form is dropped; the redirect happens either way.
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    Path(pk): Path<String>,
    form: Result<Form<ReviewForm>, FormRejection>,
) -> Response {
    let form = form_or_default(form);
    match save_review(&state, &pk, &form).await {
        Ok(location) => Redirect::to(&location).into_response(),
        Err(err) => error_page(&state, &err),
    }
}

async fn save_review(state: &AppState, pk: &str, form: &ReviewForm) -> CinemaResult<String> {
    if !pk.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CinemaError::NotFound(format!("No movie found matching '{pk}'")));
    }
    let movie_id = pk
        .parse::<i64>()
        .map_err(|_| CinemaError::NotFound(format!("No movie found matching '{pk}'")))?;
    let movie = state.catalog.published_movie(movie_id).await?;

    match form.clean() {
        Ok(review) => match state.catalog.add_review(movie.id, review).await {
            Ok(saved) => {
                tracing::info!(movie = movie.id, review = saved.id, "review added");
            }
            Err(CinemaError::ValidationError(err)) => {
                tracing::debug!(movie = movie.id, error = %err, "review rejected");
            }
            Err(err) => return Err(err),
        },
        Err(err) => tracing::debug!(movie = movie.id, error = %err, "invalid review form"),
    }
    Ok(movie.get_absolute_url())
}

/// `POST /add-rating/` - sets the caller's star for a movie.
///
/// One rating is kept per client address and movie; rating again replaces it.
pub async fn add_rating(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<RatingForm>, FormRejection>,
) -> Response {
    let form = form_or_default(form);
    let ip = client_ip(&headers, peer);
    match save_rating(&state, &ip, &form).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => json_error(&err),
    }
}

async fn save_rating(state: &AppState, ip: &str, form: &RatingForm) -> CinemaResult<()> {
    let choice = form.clean()?;
    let rating = state
        .catalog
        .rate(ip, choice.movie_id, choice.star_id)
        .await
        .map_err(|err| match err {
            CinemaError::DoesNotExist(msg) => CinemaError::BadRequest(msg),
            other => other,
        })?;
    tracing::info!(movie = rating.movie_id, star = rating.star_id, ip, "rating saved");
    Ok(())
}
