//! The `check` command.
//!
//! Runs the settings checks and validates the admin registrations. Warnings
//! are printed; any error makes the command fail.

use async_trait::async_trait;
use cinema_admin::{movies, AdminSite};
use cinema_core::checks::{run_checks, CheckMessage};
use cinema_core::{CinemaError, CinemaResult, Settings};

use crate::command::ManagementCommand;

/// Inspects the configuration for problems.
pub struct CheckCommand;

/// Collects the settings checks followed by the admin registration checks.
pub fn collect_messages(settings: &Settings) -> Vec<CheckMessage> {
    let mut site = AdminSite::new(settings.clone());
    movies::register(&mut site);

    let mut messages = run_checks(settings);
    messages.extend(site.check());
    messages
}

/// Prints `messages` and turns error-level ones into a failure.
///
/// # Errors
///
/// Returns [`CinemaError::ConfigurationError`] if any message is an error.
pub fn report(messages: &[CheckMessage]) -> CinemaResult<()> {
    if messages.is_empty() {
        println!("System check identified no issues (0 silenced).");
        return Ok(());
    }

    println!("System check identified some issues:");
    for message in messages {
        println!("{message}");
    }
    let errors = messages.iter().filter(|m| m.is_error()).count();
    if errors > 0 {
        return Err(CinemaError::ConfigurationError(format!(
            "System check identified {errors} error(s)."
        )));
    }
    println!(
        "System check identified {} issue(s) (0 silenced).",
        messages.len()
    );
    Ok(())
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Checks the settings and admin registrations for problems"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
        report(&collect_messages(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret() -> Settings {
        Settings {
            secret_key: "not-a-real-secret".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_clean_settings() {
        let messages = collect_messages(&with_secret());
        assert!(messages.is_empty(), "{messages:?}");
        assert!(report(&messages).is_ok());
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let messages = collect_messages(&Settings::default());
        assert!(messages.iter().any(|m| m.id == "security.W001"));
        assert!(report(&messages).is_ok());
    }

    #[test]
    fn test_errors_fail() {
        let settings = Settings {
            debug: false,
            movies_per_page: 0,
            ..with_secret()
        };
        let messages = collect_messages(&settings);
        let ids: Vec<&str> = messages.iter().map(|m| m.id).collect();
        assert!(ids.contains(&"security.E002"));
        assert!(ids.contains(&"settings.E001"));

        let err = report(&messages).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: System check identified 2 error(s)."
        );
    }
}
