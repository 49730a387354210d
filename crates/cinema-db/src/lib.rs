//! # cinema-db
//!
//! `SQLite` storage for the movie catalog.
//!
//! - [`database`] - the connection handle and `rusqlite` error mapping
//! - [`schema`] - migrations recorded in `cinema_migrations`
//! - [`models`] - typed rows and composite page data
//! - [`catalog`] - the queries behind the public site

pub mod catalog;
pub mod database;
pub mod models;
pub mod schema;

pub use catalog::{Catalog, MovieFilter, NewReview};
pub use database::{sql_error, Database};
