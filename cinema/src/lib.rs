//! # cinema
//!
//! A movie catalog site. This crate re-exports the workspace crates so an
//! embedding application can depend on `cinema` alone, and builds the
//! `cinema` management binary.
//!
//! ```rust,no_run
//! use cinema::core::Settings;
//! use cinema::db::{schema, Database};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let db = Database::open(&settings.database)?;
//! schema::migrate(&db, false).await?;
//! cinema::views::CinemaApp::catalog(settings, db).run("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

/// Settings, errors, system checks and logging.
pub use cinema_core as core;

/// The `SQLite` schema, migrations and catalog queries.
pub use cinema_db as db;

/// The token-authenticated admin API.
#[cfg(feature = "admin")]
pub use cinema_admin as admin;

/// Public pages, routing and the application server.
#[cfg(feature = "views")]
pub use cinema_views as views;

/// Management commands.
#[cfg(feature = "cli")]
pub use cinema_cli as cli;

pub use cinema_core::{CinemaError, CinemaResult, Settings};
