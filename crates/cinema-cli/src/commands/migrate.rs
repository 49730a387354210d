//! The `migrate` command.

use async_trait::async_trait;
use cinema_core::{CinemaResult, Settings};
use cinema_db::schema::{self, MIGRATIONS};

use super::open_database;
use crate::command::ManagementCommand;

/// Applies unapplied schema migrations to the configured database.
pub struct MigrateCommand;

/// Formats the outcome of a migration run, one line per entry.
pub fn report(applied: &[String], fake: bool) -> Vec<String> {
    let mut apps: Vec<&str> = MIGRATIONS.iter().map(|m| m.app).collect();
    apps.sort_unstable();
    apps.dedup();

    let mut lines = vec![
        "Operations to perform:".to_string(),
        format!("  Apply all migrations: {}", apps.join(", ")),
        "Running migrations:".to_string(),
    ];
    if applied.is_empty() {
        lines.push("  No migrations to apply.".to_string());
    }
    let outcome = if fake { "FAKED" } else { "OK" };
    lines.extend(
        applied
            .iter()
            .map(|label| format!("  Applying {label}... {outcome}")),
    );
    lines
}

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Updates the database schema"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("fake")
                .long("fake")
                .action(clap::ArgAction::SetTrue)
                .help("Mark migrations as applied without running them"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
        let fake = matches.get_flag("fake");
        let db = open_database(settings)?;
        let applied = schema::migrate(&db, fake).await?;
        for line in report(&applied, fake) {
            println!("{line}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_nothing_to_apply() {
        let lines = report(&[], false);
        assert_eq!(lines[1], "  Apply all migrations: admin, movies");
        assert_eq!(lines.last().unwrap(), "  No migrations to apply.");
    }

    #[test]
    fn test_report_applied_and_faked() {
        let applied = vec!["movies.0001_initial".to_string()];
        assert_eq!(
            report(&applied, false).last().unwrap(),
            "  Applying movies.0001_initial... OK"
        );
        assert_eq!(
            report(&applied, true).last().unwrap(),
            "  Applying movies.0001_initial... FAKED"
        );
    }

    #[tokio::test]
    async fn test_handle_migrates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.database = dir.path().join("db.sqlite3").display().to_string();

        let cmd = MigrateCommand;
        let matches = cmd
            .add_arguments(clap::Command::new("migrate"))
            .try_get_matches_from(["migrate"])
            .unwrap();
        cmd.handle(&matches, &settings).await.unwrap();

        let db = open_database(&settings).unwrap();
        let status = schema::show_migrations(&db).await.unwrap();
        assert!(status.iter().all(|m| m.applied));
    }
}
