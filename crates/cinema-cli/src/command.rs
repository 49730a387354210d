//! The management command framework.
//!
//! A [`ManagementCommand`] names itself, declares its clap arguments and
//! handles a parsed invocation. [`CommandRegistry`] collects commands and
//! builds the `cinema` command line out of them.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use cinema_cli::command::ManagementCommand;
//! use cinema_core::{CinemaResult, Settings};
//!
//! struct CountGenres;
//!
//! #[async_trait]
//! impl ManagementCommand for CountGenres {
//!     fn name(&self) -> &'static str { "countgenres" }
//!     fn help(&self) -> &'static str { "Print the number of genres" }
//!
//!     async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
//!         let db = cinema_db::Database::open(&settings.database)?;
//!         let sidebar = cinema_db::Catalog::new(db).sidebar().await?;
//!         println!("{}", sidebar.genres.len());
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use cinema_core::{CinemaError, CinemaResult, Settings};

/// A command invoked as `cinema <name> [args]`.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &'static str;

    /// One line of help text.
    fn help(&self) -> &'static str;

    /// Adds the command's arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()>;
}

/// The commands known to the CLI, by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Box<dyn ManagementCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing one with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command named `name`.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns the registered names, sorted.
    pub fn list_commands(&self) -> Vec<&'static str> {
        self.commands.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level command with one subcommand per registration and
    /// the global `--settings <path>` option.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("cinema")
            .about("cinema-rs management utility")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .global(true)
                    .value_name("PATH")
                    .help("TOML settings file (CINEMA_* variables still apply)"),
            );

        for (name, cmd) in &self.commands {
            let subcmd = clap::Command::new(*name).about(cmd.help());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }
        app
    }

    /// Dispatches the parsed subcommand.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::ConfigurationError`] when no subcommand was
    /// given or it is unknown, and otherwise whatever the command returns.
    pub async fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> CinemaResult<()> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            CinemaError::ConfigurationError("No subcommand specified".to_string())
        })?;
        let cmd = self
            .get(name)
            .ok_or_else(|| CinemaError::ConfigurationError(format!("Unknown command: {name}")))?;

        tracing::debug!(command = name, "running management command");
        cmd.handle(sub_matches, settings).await
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands())
            .finish()
    }
}
