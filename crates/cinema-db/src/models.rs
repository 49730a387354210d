//! Typed catalog models.
//!
//! Each model knows its table, its column list and how to build itself from
//! a `rusqlite` row. Related data (genres of a movie, replies to a review) is
//! assembled by [`crate::catalog`] into the composite types at the bottom of
//! this module.

use std::fmt;

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

/// Characters escaped in a single path segment.
pub const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A movie category ("Films", "Series", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

impl Category {
    pub const TABLE: &'static str = "movies_category";
    pub const COLUMNS: &'static str = "id, name, description, url";

    /// Builds a category from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            url: row.get("url")?,
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A person appearing in or directing movies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub description: String,
    /// Path relative to the media root, under `actors/`.
    pub image: String,
}

impl Actor {
    pub const TABLE: &'static str = "movies_actor";
    pub const COLUMNS: &'static str = "id, name, age, description, image";

    /// Builds an actor from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            description: row.get("description")?,
            image: row.get("image")?,
        })
    }

    /// Returns the public detail URL, `/actor/<name>/`.
    ///
    /// ```
    /// # use cinema_db::models::Actor;
    /// let actor = Actor {
    ///     id: 1,
    ///     name: "Keanu Reeves".into(),
    ///     age: 56,
    ///     description: String::new(),
    ///     image: String::new(),
    /// };
    /// assert_eq!(actor.get_absolute_url(), "/actor/Keanu%20Reeves/");
    /// ```
    pub fn get_absolute_url(&self) -> String {
        format!("/actor/{}/", utf8_percent_encode(&self.name, PATH_SEGMENT))
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A movie genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

impl Genre {
    pub const TABLE: &'static str = "movies_genre";
    pub const COLUMNS: &'static str = "id, name, description, url";

    /// Builds a genre from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            url: row.get("url")?,
        })
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A movie. Money columns are whole US dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub tagline: String,
    /// HTML body.
    pub description: String,
    /// Path relative to the media root, under `movies/`.
    pub poster: String,
    pub year: i64,
    pub country: String,
    pub world_premiere: NaiveDate,
    pub budget: i64,
    pub fees_in_usa: i64,
    pub fees_in_world: i64,
    pub category_id: Option<i64>,
    pub url: String,
    pub draft: bool,
}

impl Movie {
    pub const TABLE: &'static str = "movies_movie";
    pub const COLUMNS: &'static str = "id, title, tagline, description, poster, year, country, \
         world_premiere, budget, fees_in_usa, fees_in_world, category_id, url, draft";

    /// Builds a movie from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            tagline: row.get("tagline")?,
            description: row.get("description")?,
            poster: row.get("poster")?,
            year: row.get("year")?,
            country: row.get("country")?,
            world_premiere: row.get("world_premiere")?,
            budget: row.get("budget")?,
            fees_in_usa: row.get("fees_in_usa")?,
            fees_in_world: row.get("fees_in_world")?,
            category_id: row.get("category_id")?,
            url: row.get("url")?,
            draft: row.get("draft")?,
        })
    }

    /// Returns the public detail URL, `/<url>/`.
    pub fn get_absolute_url(&self) -> String {
        format!("/{}/", utf8_percent_encode(&self.url, PATH_SEGMENT))
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A still frame from a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieShot {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Path relative to the media root, under `movie_shots/`.
    pub image: String,
    pub movie_id: i64,
}

impl MovieShot {
    pub const TABLE: &'static str = "movies_movieshot";
    pub const COLUMNS: &'static str = "id, title, description, image, movie_id";

    /// Builds a shot from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            image: row.get("image")?,
            movie_id: row.get("movie_id")?,
        })
    }
}

impl fmt::Display for MovieShot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// One selectable rating value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingStar {
    pub id: i64,
    pub value: i64,
}

impl RatingStar {
    pub const TABLE: &'static str = "movies_ratingstar";
    pub const COLUMNS: &'static str = "id, value";

    /// Builds a star from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            value: row.get("value")?,
        })
    }
}

impl fmt::Display for RatingStar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A visitor's rating of a movie, one per client IP and movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub id: i64,
    pub ip: String,
    pub star_id: i64,
    pub movie_id: i64,
}

impl Rating {
    pub const TABLE: &'static str = "movies_rating";
    pub const COLUMNS: &'static str = "id, ip, star_id, movie_id";

    /// Builds a rating from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ip: row.get("ip")?,
            star_id: row.get("star_id")?,
            movie_id: row.get("movie_id")?,
        })
    }
}

/// A visitor's review, optionally replying to another review of the same movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub text: String,
    pub parent_id: Option<i64>,
    pub movie_id: i64,
}

impl Review {
    pub const TABLE: &'static str = "movies_review";
    pub const COLUMNS: &'static str = "id, email, name, text, parent_id, movie_id";

    /// Builds a review from a row selected with [`Self::COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            name: row.get("name")?,
            text: row.get("text")?,
            parent_id: row.get("parent_id")?,
            movie_id: row.get("movie_id")?,
        })
    }
}

// ── Composites ───────────────────────────────────────────────────────

/// A top-level review together with its direct replies.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewThread {
    #[serde(flatten)]
    pub review: Review,
    pub replies: Vec<Review>,
}

/// Everything the movie detail page shows.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    pub directors: Vec<Actor>,
    pub actors: Vec<Actor>,
    pub shots: Vec<MovieShot>,
    pub reviews: Vec<ReviewThread>,
}

/// An actor with the published movies they appear in and direct.
#[derive(Debug, Clone, Serialize)]
pub struct ActorDetail {
    pub actor: Actor,
    pub acted_in: Vec<Movie>,
    pub directed: Vec<Movie>,
}

/// The projection returned by the JSON filter endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieCard {
    pub title: String,
    pub tagline: String,
    pub url: String,
    pub poster: String,
}

impl From<&Movie> for MovieCard {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            tagline: movie.tagline.clone(),
            url: movie.url.clone(),
            poster: movie.poster.clone(),
        }
    }
}

/// Data shown in the sidebar of every public page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sidebar {
    pub genres: Vec<Genre>,
    pub years: Vec<i64>,
    pub categories: Vec<Category>,
    pub last_movies: Vec<Movie>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie() -> Movie {
        Movie {
            id: 1,
            title: "The Matrix".into(),
            tagline: "Welcome to the Real World".into(),
            description: "<p>Neo</p>".into(),
            poster: "movies/matrix.jpg".into(),
            year: 1999,
            country: "USA".into(),
            world_premiere: NaiveDate::from_ymd_opt(1999, 3, 31).unwrap(),
            budget: 63_000_000,
            fees_in_usa: 171_479_930,
            fees_in_world: 463_517_383,
            category_id: Some(1),
            url: "the-matrix".into(),
            draft: false,
        }
    }

    #[test]
    fn test_movie_display_and_url() {
        let m = movie();
        assert_eq!(m.to_string(), "The Matrix");
        assert_eq!(m.get_absolute_url(), "/the-matrix/");
    }

    #[test]
    fn test_actor_url_escapes_name() {
        let actor = Actor {
            id: 3,
            name: "Carrie-Anne Moss/Jr".into(),
            age: 53,
            description: String::new(),
            image: "actors/moss.jpg".into(),
        };
        assert_eq!(actor.get_absolute_url(), "/actor/Carrie-Anne%20Moss%2FJr/");
        assert_eq!(actor.to_string(), "Carrie-Anne Moss/Jr");
    }

    #[test]
    fn test_rating_star_display() {
        let star = RatingStar { id: 1, value: 5 };
        assert_eq!(star.to_string(), "5");
    }

    #[test]
    fn test_movie_card_projection() {
        let card = MovieCard::from(&movie());
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "The Matrix",
                "tagline": "Welcome to the Real World",
                "url": "the-matrix",
                "poster": "movies/matrix.jpg",
            })
        );
    }

    #[test]
    fn test_review_thread_flattens_review() {
        let thread = ReviewThread {
            review: Review {
                id: 1,
                email: "a@example.com".into(),
                name: "Ann".into(),
                text: "Great".into(),
                parent_id: None,
                movie_id: 1,
            },
            replies: Vec::new(),
        };
        let json = serde_json::to_value(&thread).unwrap();
        assert_eq!(json["name"], "Ann");
        assert!(json["replies"].as_array().unwrap().is_empty());
    }
}
