//! The `runserver` command.

use async_trait::async_trait;
use cinema_core::{CinemaError, CinemaResult, Settings};
use cinema_db::schema;
use cinema_views::CinemaApp;

use super::check::collect_messages;
use super::open_database;
use crate::command::ManagementCommand;

/// Serves the public site and the admin API.
///
/// Binds to `127.0.0.1:8000` unless `--host`/`--port` say otherwise. The
/// server refuses to start while a check reports an error.
pub struct RunserverCommand;

/// Joins host and port, bracketing bare IPv6 addresses.
pub fn bind_address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[async_trait]
impl ManagementCommand for RunserverCommand {
    fn name(&self) -> &'static str {
        "runserver"
    }

    fn help(&self) -> &'static str {
        "Starts the web server"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("host")
                .long("host")
                .default_value("127.0.0.1")
                .help("Host to bind to"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .default_value("8000")
                .value_parser(clap::value_parser!(u16))
                .help("Port to bind to"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
        let host = matches
            .get_one::<String>("host")
            .map_or("127.0.0.1", String::as_str);
        let port = matches.get_one::<u16>("port").copied().unwrap_or(8000);

        let messages = collect_messages(settings);
        for message in &messages {
            tracing::warn!("{message}");
        }
        let errors = messages.iter().filter(|m| m.is_error()).count();
        if errors > 0 {
            return Err(CinemaError::ConfigurationError(format!(
                "System check identified {errors} error(s); refusing to start."
            )));
        }

        let db = open_database(settings)?;
        let pending = schema::show_migrations(&db)
            .await?
            .iter()
            .filter(|m| !m.applied)
            .count();
        if pending > 0 {
            tracing::warn!(
                "You have {pending} unapplied migration(s). Run 'cinema migrate' to apply them."
            );
        }

        CinemaApp::catalog(settings.clone(), db)
            .run(&bind_address(host, port))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        assert_eq!(bind_address("127.0.0.1", 8000), "127.0.0.1:8000");
        assert_eq!(bind_address("::1", 9000), "[::1]:9000");
        assert_eq!(bind_address("[::]", 80), "[::]:80");
    }

    #[test]
    fn test_arguments() {
        let cmd = RunserverCommand.add_arguments(clap::Command::new("runserver"));
        let matches = cmd
            .clone()
            .try_get_matches_from(["runserver", "--host", "0.0.0.0", "--port", "9000"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("host").unwrap(), "0.0.0.0");
        assert_eq!(matches.get_one::<u16>("port"), Some(&9000));

        assert!(cmd
            .try_get_matches_from(["runserver", "--port", "http"])
            .is_err());
    }

    #[tokio::test]
    async fn test_refuses_to_start_with_errors() {
        let settings = Settings {
            filter_per_page: 0,
            database: ":memory:".to_string(),
            ..Settings::default()
        };
        let matches = RunserverCommand
            .add_arguments(clap::Command::new("runserver"))
            .try_get_matches_from(["runserver"])
            .unwrap();
        let err = RunserverCommand.handle(&matches, &settings).await.unwrap_err();
        assert!(err.to_string().contains("refusing to start"));
    }
}
