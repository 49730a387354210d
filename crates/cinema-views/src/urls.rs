//! The public URL table.
//!
//! Routes are written Django-style (`review/<int:pk>/`) in [`URL_PATTERNS`].
//! The same table drives the axum router and [`reverse`], so a link can never
//! point at a route that isn't mounted.
//!
//! ```
//! use cinema_views::urls::reverse;
//!
//! assert_eq!(reverse("movie_list", &[]).unwrap(), "/");
//! assert_eq!(reverse("add_review", &["12"]).unwrap(), "/review/12/");
//! assert_eq!(reverse("actor_detail", &["Al Pacino"]).unwrap(), "/actor/Al%20Pacino/");
//! ```

use std::sync::Arc;

use axum::routing::{get, post, MethodRouter};
use axum::Router;
use cinema_core::utils::text::is_valid_slug;
use cinema_core::{CinemaError, CinemaResult};
use cinema_db::models::PATH_SEGMENT;
use percent_encoding::utf8_percent_encode;

use crate::views::{self, AppState};

/// The handler behind a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    MovieList,
    Filter,
    AddRating,
    JsonFilter,
    MovieDetail,
    AddReview,
    ActorDetail,
}

impl View {
    fn method_router(self) -> MethodRouter<Arc<AppState>> {
        match self {
            Self::MovieList => get(views::movie_list),
            Self::Filter => get(views::filter_movies),
            Self::AddRating => post(views::add_rating),
            Self::JsonFilter => get(views::json_filter),
            Self::MovieDetail => get(views::movie_detail),
            Self::AddReview => post(views::add_review),
            Self::ActorDetail => get(views::actor_detail),
        }
    }
}

/// A named route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlPattern {
    pub name: &'static str,
    pub route: &'static str,
    pub view: View,
}

/// The public routes, in resolution order.
pub const URL_PATTERNS: [UrlPattern; 7] = [
    UrlPattern {
        name: "movie_list",
        route: "",
        view: View::MovieList,
    },
    UrlPattern {
        name: "filter",
        route: "filter/",
        view: View::Filter,
    },
    UrlPattern {
        name: "add_rating",
        route: "add-rating/",
        view: View::AddRating,
    },
    UrlPattern {
        name: "json_filter",
        route: "json-filter/",
        view: View::JsonFilter,
    },
    UrlPattern {
        name: "movie_detail",
        route: "<slug:slug>/",
        view: View::MovieDetail,
    },
    UrlPattern {
        name: "add_review",
        route: "review/<int:pk>/",
        view: View::AddReview,
    },
    UrlPattern {
        name: "actor_detail",
        route: "actor/<str:slug>/",
        view: View::ActorDetail,
    },
];

/// Splits a route into literal text and `(converter, name)` placeholders.
fn segments(route: &str) -> CinemaResult<Vec<Segment<'_>>> {
    let mut out = Vec::new();
    let mut remaining = route;
    while let Some(start) = remaining.find('<') {
        if start > 0 {
            out.push(Segment::Literal(&remaining[..start]));
        }
        let end = remaining[start..].find('>').ok_or_else(|| {
            CinemaError::ConfigurationError(format!("Unclosed angle bracket in route: {route}"))
        })? + start;
        let inner = &remaining[start + 1..end];
        let (converter, name) = inner.split_once(':').unwrap_or(("str", inner));
        out.push(Segment::Param { converter, name });
        remaining = &remaining[end + 1..];
    }
    if !remaining.is_empty() {
        out.push(Segment::Literal(remaining));
    }
    Ok(out)
}

enum Segment<'a> {
    Literal(&'a str),
    Param { converter: &'a str, name: &'a str },
}

/// Returns `true` if `value` is accepted by the path converter.
fn converter_matches(converter: &str, value: &str) -> bool {
    match converter {
        "int" => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        "slug" => is_valid_slug(value),
        "path" => !value.is_empty(),
        _ => !value.is_empty() && !value.contains('/'),
    }
}

/// Builds the path of the named route, percent-encoding each argument.
///
/// # Errors
///
/// Returns [`CinemaError::NotFound`] when the name is unknown, an argument is
/// missing or surplus, or an argument does not fit its converter.
pub fn reverse(name: &str, args: &[&str]) -> CinemaResult<String> {
    let pattern = URL_PATTERNS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| CinemaError::NotFound(format!("Reverse for '{name}' not found")))?;

    let mut path = String::from("/");
    let mut args = args.iter();
    for segment in segments(pattern.route)? {
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Param {
                converter,
                name: param,
            } => {
                let value = args.next().ok_or_else(|| {
                    CinemaError::NotFound(format!(
                        "No value provided for parameter '{param}' of '{name}'"
                    ))
                })?;
                if !converter_matches(converter, value) {
                    return Err(CinemaError::NotFound(format!(
                        "Reverse for '{name}' with argument '{value}' not found"
                    )));
                }
                path.extend(utf8_percent_encode(value, PATH_SEGMENT));
            }
        }
    }
    if args.next().is_some() {
        return Err(CinemaError::NotFound(format!(
            "Too many arguments for '{name}'"
        )));
    }
    Ok(path)
}

/// Converts a route to axum's syntax: `review/<int:pk>/` becomes `/review/{pk}/`.
///
/// # Errors
///
/// Returns [`CinemaError::ConfigurationError`] for a malformed route.
pub fn axum_path(route: &str) -> CinemaResult<String> {
    let mut path = String::from("/");
    for segment in segments(route)? {
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Param { name, .. } => {
                path.push('{');
                path.push_str(name);
                path.push('}');
            }
        }
    }
    Ok(path)
}

/// Builds the public router from [`URL_PATTERNS`].
///
/// # Errors
///
/// Returns [`CinemaError::ConfigurationError`] for a malformed route.
pub fn public_router(state: Arc<AppState>) -> CinemaResult<Router> {
    let mut router: Router<Arc<AppState>> = Router::new();
    for pattern in &URL_PATTERNS {
        router = router.route(&axum_path(pattern.route)?, pattern.view.method_router());
    }
    Ok(router.fallback(views::page_not_found).with_state(state))
}
