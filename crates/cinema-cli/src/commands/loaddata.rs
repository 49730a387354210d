//! The `loaddata` command.
//!
//! A fixture is a JSON array of objects:
//!
//! ```json
//! [
//!   {"model": "movies.category", "pk": 1, "fields": {"name": "Films", "url": "films"}},
//!   {"model": "movies.genre", "pk": 2, "fields": {"name": "Crime", "description": "Heists", "url": "crime"}}
//! ]
//! ```
//!
//! Objects go through the admin storage layer, so field names and relation
//! formats are the admin's. An object with a `pk` that already exists is
//! overwritten. Loading writes no admin history.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cinema_admin::db::{AdminDbExecutor, SqliteAdminDb};
use cinema_admin::movies;
use cinema_core::{CinemaError, CinemaResult, Settings};
use cinema_db::Database;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::open_database;
use crate::command::ManagementCommand;

/// Installs fixture files into the database.
pub struct LoaddataCommand;

/// One serialized object.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureObject {
    /// `app.model`, e.g. `movies.genre`.
    pub model: String,
    #[serde(default)]
    pub pk: Option<i64>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// What a `loaddata` run installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub objects: usize,
    pub fixtures: usize,
}

/// Reads and parses one fixture file.
///
/// # Errors
///
/// Returns [`CinemaError::NotFound`] for a missing file and
/// [`CinemaError::SerializationError`] for malformed JSON.
pub async fn read_fixture(path: &Path) -> CinemaResult<Vec<FixtureObject>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CinemaError::NotFound(format!("Fixture file not found: {}", path.display()))
        } else {
            CinemaError::IoError(e)
        }
    })?;
    serde_json::from_str(&content).map_err(|e| {
        CinemaError::SerializationError(format!("Problem installing fixture '{}': {e}", path.display()))
    })
}

/// Loads every object of every fixture, in order.
///
/// # Errors
///
/// Stops at the first unreadable fixture, unknown model, or rejected object.
/// Objects loaded before the failure stay in the database.
pub async fn load_fixtures(
    settings: &Settings,
    db: &Database,
    paths: &[PathBuf],
) -> CinemaResult<LoadSummary> {
    let registry = Arc::new(movies::registry());
    let executor = SqliteAdminDb::new(db.clone(), Arc::clone(&registry), settings.media_url.clone());
    let mut summary = LoadSummary::default();

    for path in paths {
        let objects = read_fixture(path).await?;
        for (index, object) in objects.iter().enumerate() {
            let key = object.model.to_ascii_lowercase();
            let admin = registry.get(&key).ok_or_else(|| {
                CinemaError::BadRequest(format!("Invalid model identifier: '{}'", object.model))
            })?;
            if let Err(err) = executor.load_object(admin, object.pk, &object.fields).await {
                tracing::error!(fixture = %path.display(), index, model = %key, error = %err, "could not load object");
                return Err(err);
            }
            summary.objects += 1;
        }
        summary.fixtures += 1;
    }
    Ok(summary)
}

#[async_trait]
impl ManagementCommand for LoaddataCommand {
    fn name(&self) -> &'static str {
        "loaddata"
    }

    fn help(&self) -> &'static str {
        "Installs the named fixture(s) in the database"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("fixtures")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Fixture files to load"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
        let paths: Vec<PathBuf> = matches
            .get_many::<PathBuf>("fixtures")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let db = open_database(settings)?;
        let summary = load_fixtures(settings, &db, &paths).await?;
        println!(
            "Installed {} object(s) from {} fixture(s)",
            summary.objects, summary.fixtures
        );
        Ok(())
    }
}
