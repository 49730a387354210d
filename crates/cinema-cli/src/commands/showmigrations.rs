//! The `showmigrations` command.

use async_trait::async_trait;
use cinema_core::{CinemaResult, Settings};
use cinema_db::schema::{self, MigrationStatus};

use super::open_database;
use crate::command::ManagementCommand;

/// Lists every migration, grouped by app, with `[X]` marking applied ones.
pub struct ShowmigrationsCommand;

/// Formats migration states grouped by app label.
pub fn format_status(status: &[MigrationStatus]) -> Vec<String> {
    let mut sorted: Vec<&MigrationStatus> = status.iter().collect();
    sorted.sort_by(|a, b| a.app.cmp(&b.app));

    let mut lines = Vec::new();
    let mut current: Option<&str> = None;
    for migration in sorted {
        if current != Some(migration.app.as_str()) {
            lines.push(migration.app.clone());
            current = Some(migration.app.as_str());
        }
        let mark = if migration.applied { 'X' } else { ' ' };
        lines.push(format!(" [{mark}] {}", migration.name));
    }
    lines
}

#[async_trait]
impl ManagementCommand for ShowmigrationsCommand {
    fn name(&self) -> &'static str {
        "showmigrations"
    }

    fn help(&self) -> &'static str {
        "Lists migrations and whether they are applied"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
        let db = open_database(settings)?;
        for line in format_status(&schema::show_migrations(&db).await?) {
            println!("{line}");
        }
        Ok(())
    }
}
