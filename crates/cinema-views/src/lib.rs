//! # cinema-views
//!
//! The public movie site and the server that hosts it.
//!
//! ## Modules
//!
//! - [`views`] - Handlers for the list, detail, filter, review and rating pages
//! - [`urls`] - The named route table, `reverse` and the public router
//! - [`server`] - [`CinemaApp`], which mounts the admin, files and middleware
//! - [`templates`] - Built-in Tera pages with directory overrides
//! - [`forms`] - Review and rating form validation
//! - [`pagination`] - Page arithmetic for `?page=`
//! - [`querydict`] - Multi-valued query strings

pub mod forms;
pub mod pagination;
pub mod querydict;
pub mod server;
pub mod templates;
pub mod urls;
pub mod views;

pub use server::CinemaApp;
pub use urls::reverse;
