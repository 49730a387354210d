//! Read and write queries behind the public site.
//!
//! Only published movies (`draft = 0`) are ever returned from here; drafts
//! are visible through the admin alone.

use cinema_core::{CinemaError, CinemaResult, ValidationError};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{sql_error, Database};
use crate::models::{
    Actor, ActorDetail, Category, Genre, Movie, MovieDetail, MovieShot, Rating, RatingStar,
    Review, ReviewThread, Sidebar,
};

/// How many recent movies the sidebar lists.
pub const LAST_MOVIES: usize = 5;

/// The selection submitted to the filter views.
///
/// A movie matches when its year is one of `years` OR it has one of
/// `genres`. An empty selection matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub years: Vec<i64>,
    pub genres: Vec<i64>,
}

impl MovieFilter {
    /// Returns `true` when neither years nor genres are selected.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() && self.genres.is_empty()
    }

    /// Builds the `WHERE` clause and its parameters.
    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut alternatives = Vec::new();
        let mut params = Vec::new();

        if !self.years.is_empty() {
            alternatives.push(format!("year IN ({})", placeholders(self.years.len())));
            params.extend(self.years.iter().copied().map(SqlValue::Integer));
        }
        if !self.genres.is_empty() {
            alternatives.push(format!(
                "id IN (SELECT movie_id FROM movies_movie_genres WHERE genre_id IN ({}))",
                placeholders(self.genres.len())
            ));
            params.extend(self.genres.iter().copied().map(SqlValue::Integer));
        }

        (format!("draft = 0 AND ({})", alternatives.join(" OR ")), params)
    }
}

/// A review submitted from the movie page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub name: String,
    pub email: String,
    pub text: String,
    pub parent_id: Option<i64>,
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn select_movies(
    conn: &Connection,
    where_sql: &str,
    params: &[SqlValue],
    tail: &str,
) -> CinemaResult<Vec<Movie>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {where_sql} {tail}",
        Movie::COLUMNS,
        Movie::TABLE
    );
    let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), Movie::from_row)
        .map_err(sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
}

fn count(conn: &Connection, sql: &str, params: &[SqlValue]) -> CinemaResult<usize> {
    let n: i64 = conn
        .query_row(sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))
        .map_err(sql_error)?;
    Ok(usize::try_from(n).unwrap_or(0))
}

fn all<T>(
    conn: &Connection,
    sql: &str,
    param: Option<i64>,
    from_row: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> CinemaResult<Vec<T>> {
    let mut stmt = conn.prepare(sql).map_err(sql_error)?;
    let rows = match param {
        Some(id) => stmt.query_map([id], from_row),
        None => stmt.query_map([], from_row),
    }
    .map_err(sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn published_movie(conn: &Connection, id: i64) -> CinemaResult<Movie> {
    select_movies(conn, "id = ? AND draft = 0", &[SqlValue::Integer(id)], "")?
        .into_iter()
        .next()
        .ok_or_else(|| CinemaError::DoesNotExist(format!("Movie {id} does not exist")))
}

fn sidebar(conn: &Connection) -> CinemaResult<Sidebar> {
    let genres = all(
        conn,
        &format!("SELECT {} FROM {} ORDER BY id", Genre::COLUMNS, Genre::TABLE),
        None,
        Genre::from_row,
    )?;
    let categories = all(
        conn,
        &format!("SELECT {} FROM {} ORDER BY id", Category::COLUMNS, Category::TABLE),
        None,
        Category::from_row,
    )?;
    let years = all(
        conn,
        "SELECT DISTINCT year FROM movies_movie WHERE draft = 0 ORDER BY year",
        None,
        |row| row.get(0),
    )?;
    let last_movies = select_movies(
        conn,
        "draft = 0",
        &[],
        &format!("ORDER BY id DESC LIMIT {LAST_MOVIES}"),
    )?;
    Ok(Sidebar {
        genres,
        years,
        categories,
        last_movies,
    })
}

fn review_threads(conn: &Connection, movie_id: i64) -> CinemaResult<Vec<ReviewThread>> {
    let reviews = all(
        conn,
        &format!(
            "SELECT {} FROM {} WHERE movie_id = ? ORDER BY id",
            Review::COLUMNS,
            Review::TABLE
        ),
        Some(movie_id),
        Review::from_row,
    )?;

    let (top_level, replies): (Vec<Review>, Vec<Review>) =
        reviews.into_iter().partition(|r| r.parent_id.is_none());

    Ok(top_level
        .into_iter()
        .map(|review| {
            let replies = replies
                .iter()
                .filter(|reply| reply.parent_id == Some(review.id))
                .cloned()
                .collect();
            ReviewThread { review, replies }
        })
        .collect())
}

/// Catalog queries over a [`Database`].
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
}

impl Catalog {
    /// Wraps a database handle.
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Counts published movies.
    pub async fn count_published(&self) -> CinemaResult<usize> {
        self.db
            .call(|conn| count(conn, "SELECT COUNT(*) FROM movies_movie WHERE draft = 0", &[]))
            .await
    }

    /// Returns a window of published movies ordered by id.
    pub async fn published_movies(&self, offset: usize, limit: usize) -> CinemaResult<Vec<Movie>> {
        self.db
            .call(move |conn| {
                select_movies(
                    conn,
                    "draft = 0",
                    &[SqlValue::Integer(to_i64(limit)), SqlValue::Integer(to_i64(offset))],
                    "ORDER BY id LIMIT ? OFFSET ?",
                )
            })
            .await
    }

    /// Loads a published movie by slug with everything its page shows.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::DoesNotExist`] when no published movie has `slug`.
    pub async fn movie_by_slug(&self, slug: &str) -> CinemaResult<MovieDetail> {
        let slug = slug.to_string();
        self.db
            .call(move |conn| {
                let conn: &Connection = conn;
                let movie = select_movies(
                    conn,
                    "url = ? AND draft = 0",
                    &[SqlValue::Text(slug.clone())],
                    "",
                )?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    CinemaError::DoesNotExist(format!("Movie with url '{slug}' does not exist"))
                })?;

                let category = match movie.category_id {
                    Some(id) => conn
                        .query_row(
                            &format!(
                                "SELECT {} FROM {} WHERE id = ?",
                                Category::COLUMNS,
                                Category::TABLE
                            ),
                            [id],
                            Category::from_row,
                        )
                        .optional()
                        .map_err(sql_error)?,
                    None => None,
                };

                let related_actors = |join_table: &str| {
                    all(
                        conn,
                        &format!(
                            "SELECT {} FROM {} WHERE id IN \
                             (SELECT actor_id FROM {join_table} WHERE movie_id = ?) ORDER BY id",
                            Actor::COLUMNS,
                            Actor::TABLE
                        ),
                        Some(movie.id),
                        Actor::from_row,
                    )
                };
                let directors = related_actors("movies_movie_directors")?;
                let actors = related_actors("movies_movie_actors")?;

                let genres = all(
                    conn,
                    &format!(
                        "SELECT {} FROM {} WHERE id IN \
                         (SELECT genre_id FROM movies_movie_genres WHERE movie_id = ?) ORDER BY id",
                        Genre::COLUMNS,
                        Genre::TABLE
                    ),
                    Some(movie.id),
                    Genre::from_row,
                )?;

                let shots = all(
                    conn,
                    &format!(
                        "SELECT {} FROM {} WHERE movie_id = ? ORDER BY id",
                        MovieShot::COLUMNS,
                        MovieShot::TABLE
                    ),
                    Some(movie.id),
                    MovieShot::from_row,
                )?;

                let reviews = review_threads(conn, movie.id)?;

                Ok(MovieDetail {
                    movie,
                    category,
                    genres,
                    directors,
                    actors,
                    shots,
                    reviews,
                })
            })
            .await
    }

    /// Loads an actor by exact name along with their published filmography.
    ///
    /// When several actors share a name the oldest record wins.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::DoesNotExist`] when no actor has `name`.
    pub async fn actor_by_name(&self, name: &str) -> CinemaResult<ActorDetail> {
        let name = name.to_string();
        self.db
            .call(move |conn| {
                let conn: &Connection = conn;
                let actor = conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM {} WHERE name = ? ORDER BY id LIMIT 1",
                            Actor::COLUMNS,
                            Actor::TABLE
                        ),
                        [&name],
                        Actor::from_row,
                    )
                    .optional()
                    .map_err(sql_error)?
                    .ok_or_else(|| {
                        CinemaError::DoesNotExist(format!("Actor '{name}' does not exist"))
                    })?;

                let films = |join_table: &str| {
                    select_movies(
                        conn,
                        &format!(
                            "draft = 0 AND id IN (SELECT movie_id FROM {join_table} WHERE actor_id = ?)"
                        ),
                        &[SqlValue::Integer(actor.id)],
                        "ORDER BY id",
                    )
                };
                let acted_in = films("movies_movie_actors")?;
                let directed = films("movies_movie_directors")?;

                Ok(ActorDetail {
                    actor,
                    acted_in,
                    directed,
                })
            })
            .await
    }

    /// Returns the sidebar data: genres, published years, categories and
    /// the most recent published movies.
    pub async fn sidebar(&self) -> CinemaResult<Sidebar> {
        self.db.call(|conn| sidebar(conn)).await
    }

    /// Counts published movies matching `filter`.
    pub async fn count_filtered(&self, filter: &MovieFilter) -> CinemaResult<usize> {
        if filter.is_empty() {
            return Ok(0);
        }
        let (where_sql, params) = filter.where_clause();
        self.db
            .call(move |conn| {
                count(
                    conn,
                    &format!("SELECT COUNT(*) FROM movies_movie WHERE {where_sql}"),
                    &params,
                )
            })
            .await
    }

    /// Returns a window of published movies matching `filter`, ordered by id.
    pub async fn filter_movies(
        &self,
        filter: &MovieFilter,
        offset: usize,
        limit: usize,
    ) -> CinemaResult<Vec<Movie>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        let (where_sql, mut params) = filter.where_clause();
        params.push(SqlValue::Integer(to_i64(limit)));
        params.push(SqlValue::Integer(to_i64(offset)));
        self.db
            .call(move |conn| select_movies(conn, &where_sql, &params, "ORDER BY id LIMIT ? OFFSET ?"))
            .await
    }

    /// Returns every published movie matching `filter`.
    pub async fn filter_movies_all(&self, filter: &MovieFilter) -> CinemaResult<Vec<Movie>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        let (where_sql, params) = filter.where_clause();
        self.db
            .call(move |conn| select_movies(conn, &where_sql, &params, "ORDER BY id"))
            .await
    }

    /// Returns a published movie by id.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::DoesNotExist`] for unknown or draft movies.
    pub async fn published_movie(&self, id: i64) -> CinemaResult<Movie> {
        self.db.call(move |conn| published_movie(conn, id)).await
    }

    /// Saves a review against a published movie.
    ///
    /// # Errors
    ///
    /// - [`CinemaError::DoesNotExist`] if the movie is unknown or a draft.
    /// - [`CinemaError::ValidationError`] if `parent_id` is not a review of
    ///   the same movie.
    pub async fn add_review(&self, movie_id: i64, review: NewReview) -> CinemaResult<Review> {
        self.db
            .transaction(move |tx| {
                published_movie(tx, movie_id)?;

                if let Some(parent_id) = review.parent_id {
                    let parent_movie: Option<i64> = tx
                        .query_row(
                            "SELECT movie_id FROM movies_review WHERE id = ?",
                            [parent_id],
                            |row| row.get(0),
                        )
                        .optional()
                        .map_err(sql_error)?;
                    if parent_movie != Some(movie_id) {
                        let mut err = ValidationError::empty();
                        err.add_field_error(
                            "parent",
                            ValidationError::new(
                                "Select a review of the same movie.",
                                "invalid_choice",
                            ),
                        );
                        return Err(err.into());
                    }
                }

                tx.execute(
                    "INSERT INTO movies_review (email, name, text, parent_id, movie_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![review.email, review.name, review.text, review.parent_id, movie_id],
                )
                .map_err(sql_error)?;
                let id = tx.last_insert_rowid();
                tracing::info!(review_id = id, movie_id, "review added");

                Ok(Review {
                    id,
                    email: review.email,
                    name: review.name,
                    text: review.text,
                    parent_id: review.parent_id,
                    movie_id,
                })
            })
            .await
    }

    /// Records `ip`'s rating of a movie, replacing any earlier rating from
    /// the same address.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::DoesNotExist`] if the movie (published) or the
    /// star does not exist.
    pub async fn rate(&self, ip: &str, movie_id: i64, star_id: i64) -> CinemaResult<Rating> {
        let ip = ip.to_string();
        self.db
            .transaction(move |tx| {
                published_movie(tx, movie_id)?;
                let star_exists = tx
                    .query_row(
                        "SELECT 1 FROM movies_ratingstar WHERE id = ?",
                        [star_id],
                        |_| Ok(()),
                    )
                    .optional()
                    .map_err(sql_error)?
                    .is_some();
                if !star_exists {
                    return Err(CinemaError::DoesNotExist(format!(
                        "Rating star {star_id} does not exist"
                    )));
                }

                tx.execute(
                    "INSERT INTO movies_rating (ip, star_id, movie_id) VALUES (?1, ?2, ?3) \
                     ON CONFLICT (ip, movie_id) DO UPDATE SET star_id = excluded.star_id",
                    params![ip, star_id, movie_id],
                )
                .map_err(sql_error)?;

                let rating = tx
                    .query_row(
                        &format!(
                            "SELECT {} FROM {} WHERE ip = ? AND movie_id = ?",
                            Rating::COLUMNS,
                            Rating::TABLE
                        ),
                        params![ip, movie_id],
                        Rating::from_row,
                    )
                    .map_err(sql_error)?;
                tracing::info!(movie_id, star_id, "rating recorded");
                Ok(rating)
            })
            .await
    }

    /// Returns the rating choices, highest value first.
    pub async fn rating_stars(&self) -> CinemaResult<Vec<RatingStar>> {
        self.db
            .call(|conn| {
                all(
                    conn,
                    &format!(
                        "SELECT {} FROM {} ORDER BY value DESC, id",
                        RatingStar::COLUMNS,
                        RatingStar::TABLE
                    ),
                    None,
                    RatingStar::from_row,
                )
            })
            .await
    }
}
