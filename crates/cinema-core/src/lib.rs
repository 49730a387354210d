//! # cinema-core
//!
//! Core types, settings, and error types for the cinema-rs catalog.
//! This crate has no web or database dependencies and provides the foundation
//! for all other crates.
//!
//! ## Modules
//!
//! - [`checks`] - Configuration checks
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Catalog settings and their defaults
//! - [`settings_loader`] - TOML and environment loading
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Text helpers (`slugify`, slug and email validation)

pub mod checks;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{CinemaError, CinemaResult, ValidationError};
pub use settings::{AdminUserSettings, Settings};
