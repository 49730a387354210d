//! Schema migrations.
//!
//! Migrations are plain SQL scripts applied in declaration order. Applied
//! migrations are recorded in the `cinema_migrations` table, so running
//! [`migrate`] twice is a no-op the second time.

use cinema_core::CinemaResult;

use crate::database::{sql_error, Database};

/// A named schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// The owning app label (`movies`, `admin`).
    pub app: &'static str,
    /// The migration name, unique within the app.
    pub name: &'static str,
    /// The SQL executed when applying.
    pub sql: &'static str,
}

/// The state of one migration, as reported by [`show_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// The owning app label.
    pub app: String,
    /// The migration name.
    pub name: String,
    /// Whether the migration is recorded as applied.
    pub applied: bool,
}

/// Every migration, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        app: "movies",
        name: "0001_initial",
        sql: MOVIES_INITIAL,
    },
    Migration {
        app: "admin",
        name: "0001_initial",
        sql: ADMIN_INITIAL,
    },
];

const MOVIES_INITIAL: &str = r"
CREATE TABLE movies_category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(150) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    url VARCHAR(160) NOT NULL UNIQUE
);

CREATE TABLE movies_actor (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL,
    age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
    description TEXT NOT NULL DEFAULT '',
    image VARCHAR(100) NOT NULL DEFAULT ''
);

CREATE TABLE movies_genre (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    url VARCHAR(160) NOT NULL UNIQUE
);

CREATE TABLE movies_movie (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(100) NOT NULL,
    tagline VARCHAR(100) NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    poster VARCHAR(100) NOT NULL DEFAULT '',
    year INTEGER NOT NULL DEFAULT 2019 CHECK (year >= 0),
    country VARCHAR(30) NOT NULL DEFAULT '',
    world_premiere DATE NOT NULL DEFAULT (date('now')),
    budget INTEGER NOT NULL DEFAULT 0 CHECK (budget >= 0),
    fees_in_usa INTEGER NOT NULL DEFAULT 0 CHECK (fees_in_usa >= 0),
    fees_in_world INTEGER NOT NULL DEFAULT 0 CHECK (fees_in_world >= 0),
    category_id INTEGER NULL REFERENCES movies_category (id) ON DELETE SET NULL,
    url VARCHAR(130) NOT NULL UNIQUE,
    draft BOOLEAN NOT NULL DEFAULT 0
);
CREATE INDEX movies_movie_category_id ON movies_movie (category_id);

CREATE TABLE movies_movie_directors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies_movie (id) ON DELETE CASCADE,
    actor_id INTEGER NOT NULL REFERENCES movies_actor (id) ON DELETE CASCADE,
    UNIQUE (movie_id, actor_id)
);

CREATE TABLE movies_movie_actors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies_movie (id) ON DELETE CASCADE,
    actor_id INTEGER NOT NULL REFERENCES movies_actor (id) ON DELETE CASCADE,
    UNIQUE (movie_id, actor_id)
);

CREATE TABLE movies_movie_genres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies_movie (id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES movies_genre (id) ON DELETE CASCADE,
    UNIQUE (movie_id, genre_id)
);
CREATE INDEX movies_movie_genres_genre_id ON movies_movie_genres (genre_id);

CREATE TABLE movies_movieshot (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(100) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    image VARCHAR(100) NOT NULL DEFAULT '',
    movie_id INTEGER NOT NULL REFERENCES movies_movie (id) ON DELETE CASCADE
);
CREATE INDEX movies_movieshot_movie_id ON movies_movieshot (movie_id);

CREATE TABLE movies_ratingstar (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value SMALLINT NOT NULL DEFAULT 0
);

CREATE TABLE movies_rating (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ip VARCHAR(45) NOT NULL,
    star_id INTEGER NOT NULL REFERENCES movies_ratingstar (id) ON DELETE CASCADE,
    movie_id INTEGER NOT NULL REFERENCES movies_movie (id) ON DELETE CASCADE,
    UNIQUE (ip, movie_id)
);

CREATE TABLE movies_review (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email VARCHAR(254) NOT NULL,
    name VARCHAR(100) NOT NULL,
    text VARCHAR(5000) NOT NULL,
    parent_id INTEGER NULL REFERENCES movies_review (id) ON DELETE SET NULL,
    movie_id INTEGER NOT NULL REFERENCES movies_movie (id) ON DELETE CASCADE
);
CREATE INDEX movies_review_movie_id ON movies_review (movie_id);
";

const ADMIN_INITIAL: &str = r"
CREATE TABLE admin_logentry (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action_time TEXT NOT NULL,
    username VARCHAR(150) NOT NULL,
    app_label VARCHAR(100) NOT NULL,
    model_name VARCHAR(100) NOT NULL,
    object_id TEXT NULL,
    object_repr VARCHAR(200) NOT NULL,
    action_flag SMALLINT NOT NULL CHECK (action_flag IN (1, 2, 3)),
    change_message TEXT NOT NULL DEFAULT ''
);
";

const RECORDER_TABLE: &str = "CREATE TABLE IF NOT EXISTS cinema_migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    app VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    applied TEXT NOT NULL,
    UNIQUE (app, name)
)";

fn applied_set(conn: &rusqlite::Connection) -> CinemaResult<Vec<(String, String)>> {
    conn.execute_batch(RECORDER_TABLE).map_err(sql_error)?;
    let mut stmt = conn
        .prepare("SELECT app, name FROM cinema_migrations ORDER BY id")
        .map_err(sql_error)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
}

/// Applies every unapplied migration and returns the `app.name` labels applied.
///
/// Each migration runs in its own transaction together with its record. With
/// `fake`, migrations are recorded without running their SQL.
///
/// # Errors
///
/// Returns the mapped database error of the first failing migration; earlier
/// migrations stay applied.
pub async fn migrate(db: &Database, fake: bool) -> CinemaResult<Vec<String>> {
    db.call(move |conn| {
        let applied = applied_set(conn)?;
        let mut newly_applied = Vec::new();

        for migration in MIGRATIONS {
            if applied
                .iter()
                .any(|(app, name)| app == migration.app && name == migration.name)
            {
                continue;
            }

            let tx = conn.transaction().map_err(sql_error)?;
            if !fake {
                tx.execute_batch(migration.sql).map_err(sql_error)?;
            }
            tx.execute(
                "INSERT INTO cinema_migrations (app, name, applied) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    migration.app,
                    migration.name,
                    chrono::Utc::now().to_rfc3339()
                ],
            )
            .map_err(sql_error)?;
            tx.commit().map_err(sql_error)?;

            tracing::info!(app = migration.app, name = migration.name, fake, "applied migration");
            newly_applied.push(format!("{}.{}", migration.app, migration.name));
        }

        Ok(newly_applied)
    })
    .await
}

/// Lists every known migration with its applied state.
///
/// # Errors
///
/// Returns the mapped database error if the recorder table cannot be read.
pub async fn show_migrations(db: &Database) -> CinemaResult<Vec<MigrationStatus>> {
    db.call(|conn| {
        let applied = applied_set(conn)?;
        Ok(MIGRATIONS
            .iter()
            .map(|m| MigrationStatus {
                app: m.app.to_string(),
                name: m.name.to_string(),
                applied: applied
                    .iter()
                    .any(|(app, name)| app == m.app && name == m.name),
            })
            .collect())
    })
    .await
}
