//! The built-in management commands.

pub mod check;
pub mod loaddata;
pub mod migrate;
pub mod runserver;
pub mod showmigrations;

pub use check::CheckCommand;
pub use loaddata::LoaddataCommand;
pub use migrate::MigrateCommand;
pub use runserver::RunserverCommand;
pub use showmigrations::ShowmigrationsCommand;

use cinema_core::{CinemaResult, Settings};
use cinema_db::Database;

use crate::command::CommandRegistry;

/// Registers every built-in command.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(RunserverCommand));
    registry.register(Box::new(MigrateCommand));
    registry.register(Box::new(ShowmigrationsCommand));
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(LoaddataCommand));
}

/// Opens the configured database.
pub(crate) fn open_database(settings: &Settings) -> CinemaResult<Database> {
    Database::open(&settings.database)
}
