//! End-to-end runs of the management commands against a database file.

use std::path::{Path, PathBuf};

use cinema_cli::commands::loaddata::{load_fixtures, read_fixture, LoadSummary};
use cinema_cli::default_registry;
use cinema_core::{CinemaError, Settings};
use cinema_db::schema::show_migrations;
use cinema_db::{Catalog, Database};
use serde_json::json;

const CATALOG_FIXTURE: &str = r#"[
    {"model": "movies.category", "pk": 1, "fields": {"name": "Films", "url": "films"}},
    {"model": "movies.genre", "pk": 2, "fields": {"name": "Crime", "description": "Heists", "url": "crime"}},
    {"model": "movies.actor", "pk": 3, "fields": {"name": "Michael Mann", "description": "Director", "image": "actors/mann.jpg"}},
    {"model": "Movies.Movie", "pk": 4, "fields": {
        "title": "Heat",
        "description": "<p>Story</p>",
        "poster": "movies/heat.jpg",
        "country": "USA",
        "year": 1995,
        "category": 1,
        "directors": [3],
        "actors": [3],
        "genres": [2],
        "url": "heat"
    }}
]"#;

struct Site {
    _dir: tempfile::TempDir,
    root: PathBuf,
    settings: Settings,
}

impl Site {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let settings = Settings {
            database: root.join("db.sqlite3").to_string_lossy().into_owned(),
            secret_key: "test-secret".to_string(),
            ..Settings::default()
        };
        Self {
            _dir: dir,
            root,
            settings,
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    async fn run(&self, args: &[&str]) -> Result<(), CinemaError> {
        let registry = default_registry();
        let argv = std::iter::once("cinema").chain(args.iter().copied());
        let matches = registry.build_cli().try_get_matches_from(argv).unwrap();
        registry.execute(&matches, &self.settings).await
    }

    fn database(&self) -> Database {
        Database::open(&self.settings.database).unwrap()
    }
}

#[tokio::test]
async fn test_migrate_then_load_catalog() {
    let site = Site::new();
    site.run(&["migrate"]).await.unwrap();
    assert!(show_migrations(&site.database())
        .await
        .unwrap()
        .iter()
        .all(|m| m.applied));

    let fixture = site.write("catalog.json", CATALOG_FIXTURE);
    site.run(&["loaddata", fixture.to_str().unwrap()]).await.unwrap();

    let catalog = Catalog::new(site.database());
    assert_eq!(catalog.count_published().await.unwrap(), 1);
    let movie = catalog.movie_by_slug("heat").await.unwrap();
    assert_eq!(movie.movie.id, 4);
    assert_eq!(movie.movie.title, "Heat");
}

#[tokio::test]
async fn test_loading_twice_overwrites() {
    let site = Site::new();
    site.run(&["migrate"]).await.unwrap();
    let first = site.write("catalog.json", CATALOG_FIXTURE);
    let rename = site.write(
        "rename.json",
        &json!([{"model": "movies.genre", "pk": 2, "fields": {"name": "Heist"}}]).to_string(),
    );

    let db = site.database();
    let summary = load_fixtures(&site.settings, &db, &[first.clone(), first, rename])
        .await
        .unwrap();
    assert_eq!(
        summary,
        LoadSummary {
            objects: 9,
            fixtures: 3
        }
    );

    let sidebar = Catalog::new(db).sidebar().await.unwrap();
    assert_eq!(sidebar.genres.len(), 1);
    assert_eq!(sidebar.genres[0].name, "Heist");
}

#[tokio::test]
async fn test_unknown_model_rejected() {
    let site = Site::new();
    site.run(&["migrate"]).await.unwrap();
    let fixture = site.write(
        "users.json",
        r#"[{"model": "auth.user", "pk": 1, "fields": {"username": "root"}}]"#,
    );
    let err = site
        .run(&["loaddata", fixture.to_str().unwrap()])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Bad request: Invalid model identifier: 'auth.user'");
}

#[tokio::test]
async fn test_missing_and_malformed_fixtures() {
    let site = Site::new();
    let missing = read_fixture(Path::new("/nonexistent/fixture.json"))
        .await
        .unwrap_err();
    assert!(matches!(missing, CinemaError::NotFound(_)));

    let broken = site.write("broken.json", "[{\"model\": ");
    let err = read_fixture(&broken).await.unwrap_err();
    assert!(matches!(err, CinemaError::SerializationError(_)));
}

#[tokio::test]
async fn test_invalid_object_stops_loading() {
    let site = Site::new();
    site.run(&["migrate"]).await.unwrap();
    let fixture = site.write(
        "partial.json",
        &json!([
            {"model": "movies.category", "pk": 1, "fields": {"name": "Films", "url": "films"}},
            {"model": "movies.category", "pk": 2, "fields": {"url": "no-name"}}
        ])
        .to_string(),
    );
    let err = site
        .run(&["loaddata", fixture.to_str().unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, CinemaError::ValidationError(_)), "{err}");
}

#[tokio::test]
async fn test_check_command_fails_on_errors() {
    let mut site = Site::new();
    assert!(site.run(&["check"]).await.is_ok());

    site.settings.movies_per_page = 0;
    let err = site.run(&["check"]).await.unwrap_err();
    assert!(matches!(err, CinemaError::ConfigurationError(_)));
}
