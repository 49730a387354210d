//! Read-only photo preview columns.
//!
//! A preview renders the stored image path of a row as an `<img>` tag so the
//! admin list and change views can show posters and stills inline.

use cinema_core::utils::text::escape_html;
use serde::Serialize;

/// Renders `<img src="{media_url}{path}" width="{width}" height="{height}">`.
///
/// An empty path renders as an empty string.
///
/// # Examples
///
/// ```
/// use cinema_admin::photo::image_tag;
///
/// assert_eq!(
///     image_tag("/media/", "movies/matrix.jpg", 110, 110),
///     r#"<img src="/media/movies/matrix.jpg" width="110" height="110">"#
/// );
/// assert_eq!(image_tag("/media/", "", 50, 50), "");
/// ```
pub fn image_tag(media_url: &str, path: &str, width: u32, height: u32) -> String {
    if path.is_empty() {
        return String::new();
    }
    let src = escape_html(&format!("{media_url}{path}"));
    format!(r#"<img src="{src}" width="{width}" height="{height}">"#)
}

/// A computed column showing the image stored in `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoPreview {
    /// Column name exposed by the admin (e.g. `"poster_preview"`).
    pub name: String,
    /// The image field holding the path.
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Column heading.
    pub label: String,
}

impl PhotoPreview {
    /// Creates a preview of `source` labelled "Image".
    pub fn new(name: &str, source: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            width,
            height,
            label: "Image".to_string(),
        }
    }

    /// Sets the column heading.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Renders the tag for a stored path.
    pub fn render(&self, media_url: &str, path: &str) -> String {
        image_tag(media_url, path, self.width, self.height)
    }
}
