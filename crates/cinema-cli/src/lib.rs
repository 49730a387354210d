//! # cinema-cli
//!
//! The `cinema` management commands: `runserver`, `migrate`,
//! `showmigrations`, `check` and `loaddata`.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = cinema_cli::default_registry();
//! let matches = registry.build_cli().get_matches();
//! let settings = cinema_cli::load_settings(matches.get_one::<String>("settings").map(String::as_str))?;
//! registry.execute(&matches, &settings).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod commands;

use cinema_core::{settings_loader, CinemaResult, Settings};

pub use command::{CommandRegistry, ManagementCommand};

/// Returns a registry holding every built-in command.
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    commands::register_builtin_commands(&mut registry);
    registry
}

/// Loads settings from a TOML file when one is given, otherwise from the
/// defaults. `CINEMA_*` environment variables apply either way.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_settings(path: Option<&str>) -> CinemaResult<Settings> {
    match path {
        Some(path) => settings_loader::from_toml_file_with_env(path),
        None => Ok(settings_loader::from_env()),
    }
}
