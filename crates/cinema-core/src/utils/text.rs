//! String utility functions.
//!
//! Slug generation for prepopulated `url` fields, plus the slug and email
//! format checks used when validating admin input and review submissions.

use deunicode::deunicode;
use regex::Regex;
use std::sync::OnceLock;

/// Converts a string to a URL-friendly slug.
///
/// Transliterates to ASCII, converts to lowercase, removes non-alphanumeric
/// characters (except hyphens, underscores and spaces), replaces spaces with
/// hyphens, and collapses consecutive hyphens. The result always passes
/// [`is_valid_slug`] unless it is empty.
///
/// # Examples
///
/// ```
/// use cinema_core::utils::text::slugify;
///
/// assert_eq!(slugify("The Terminator"), "the-terminator");
/// assert_eq!(slugify("  Spaced  Out  "), "spaced-out");
/// assert_eq!(slugify("Sci-Fi & Fantasy"), "sci-fi-fantasy");
/// assert_eq!(slugify("Amélie"), "amelie");
/// ```
pub fn slugify(s: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    static MULTI_HYPHEN: OnceLock<Regex> = OnceLock::new();

    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid regex"));
    let multi_hyphen = MULTI_HYPHEN.get_or_init(|| Regex::new(r"[-\s]+").expect("valid regex"));

    let s = deunicode(s).to_lowercase();
    let s = non_alnum.replace_all(&s, "");
    let s = multi_hyphen.replace_all(&s, "-");
    s.trim_matches('-').to_string()
}

/// Returns `true` if `s` is a non-empty slug of letters, digits, hyphens and underscores.
///
/// # Examples
///
/// ```
/// use cinema_core::utils::text::is_valid_slug;
///
/// assert!(is_valid_slug("the-terminator_2"));
/// assert!(!is_valid_slug("two words"));
/// assert!(!is_valid_slug(""));
/// ```
pub fn is_valid_slug(s: &str) -> bool {
    static SLUG_RE: OnceLock<Regex> = OnceLock::new();
    SLUG_RE
        .get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"))
        .is_match(s)
}

/// Returns `true` if `s` looks like an email address.
pub fn is_valid_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
        })
        .is_match(s)
}

/// Capitalizes the first character of a string.
///
/// # Examples
///
/// ```
/// use cinema_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("movie shots"), "Movie shots");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.extend(chars);
        result
    })
}

/// Turns a field name into a column label: `fees_in_usa` becomes `Fees in usa`.
pub fn verbose_name(field: &str) -> String {
    capfirst(&field.replace('_', " "))
}

/// Escapes the five HTML-significant characters.
///
/// ```
/// use cinema_core::utils::text::escape_html;
///
/// assert_eq!(escape_html(r#"a "b" <c>"#), "a &quot;b&quot; &lt;c&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
