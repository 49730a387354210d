//! Utility functions.
//!
//! - [`text`]: string helpers (`slugify`, `escape_html`, `is_valid_slug`, ...).

pub mod text;
