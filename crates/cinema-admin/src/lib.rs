//! # cinema-admin
//!
//! The back-office API for the movie catalog. Every catalog table is
//! registered with a [`ModelAdmin`](model_admin::ModelAdmin) describing how it
//! is listed, searched, filtered, and edited; [`AdminSite`](site::AdminSite)
//! turns the registrations into an axum router mounted at `/api/admin`.
//!
//! ## Modules
//!
//! - [`model_admin`] - `ModelAdmin` configuration, field schema, inlines
//! - [`movies`] - The catalog registrations
//! - [`actions`] - Bulk actions (`delete_selected`, publish/unpublish)
//! - [`photo`] - Read-only `<img>` preview columns
//! - [`messages`] - Admin messages returned with action results
//! - [`log_entry`] - Audit log of admin changes
//! - [`db`] - SQL layer behind the CRUD endpoints
//! - [`validation`] - Cleaning of submitted form data
//! - [`auth`] - Bearer-token authentication and permissions
//! - [`api`] - JSON response types
//! - [`site`] - The `AdminSite` router

pub mod actions;
pub mod api;
pub mod auth;
pub mod db;
pub mod log_entry;
pub mod messages;
pub mod model_admin;
pub mod movies;
pub mod photo;
pub mod site;
pub mod validation;

pub use model_admin::{FieldSchema, ModelAdmin, ModelRegistry};
pub use site::AdminSite;
