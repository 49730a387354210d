//! Multi-valued query strings.
//!
//! The filter pages are driven by repeated keys (`?year=1999&year=2003`),
//! which `axum::extract::Query` into a map would collapse. [`QueryDict`]
//! keeps every pair in the order it arrived.

use url::form_urlencoded;

/// An ordered list of decoded `key=value` pairs.
///
/// # Examples
///
/// ```
/// use cinema_views::querydict::QueryDict;
///
/// let qd = QueryDict::parse("year=1999&genre=2&year=2003&page=");
/// assert_eq!(qd.get_list("year"), vec!["1999", "2003"]);
/// assert_eq!(qd.get("year"), Some("2003"));
/// assert_eq!(qd.get("page"), Some(""));
/// assert_eq!(qd.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    pairs: Vec<(String, String)>,
}

impl QueryDict {
    /// Creates an empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string. `+` decodes to a
    /// space and invalid percent escapes are kept literally.
    pub fn parse(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Returns the last value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `key`, in order.
    pub fn get_list(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Appends a value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns `true` if `key` occurs at least once.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encodes every pair back into a query string, preserving order.
    pub fn urlencode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Encodes the values of `key` as a link prefix: one `key=value&` per value.
    ///
    /// Pagination links append `page=N` to this, keeping the selection.
    ///
    /// ```
    /// use cinema_views::querydict::QueryDict;
    ///
    /// let qd = QueryDict::parse("year=1999&year=2003&genre=1");
    /// assert_eq!(qd.prefix_for("year"), "year=1999&year=2003&");
    /// assert_eq!(qd.prefix_for("page"), "");
    /// ```
    pub fn prefix_for(&self, key: &str) -> String {
        self.get_list(key)
            .into_iter()
            .map(|value| {
                let mut pair = form_urlencoded::Serializer::new(String::new());
                pair.append_pair(key, value);
                format!("{}&", pair.finish())
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for QueryDict {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes() {
        let qd = QueryDict::parse("q=hello+world&name=Carrie-Anne%20Moss&flag");
        assert_eq!(qd.get("q"), Some("hello world"));
        assert_eq!(qd.get("name"), Some("Carrie-Anne Moss"));
        assert_eq!(qd.get("flag"), Some(""));
        assert_eq!(qd.len(), 3);
    }

    #[test]
    fn test_parse_empty() {
        let qd = QueryDict::parse("");
        assert!(qd.is_empty());
        assert!(qd.get_list("year").is_empty());
    }

    #[test]
    fn test_append_and_urlencode_keep_order() {
        let mut qd = QueryDict::new();
        qd.append("year", "2003");
        qd.append("genre", "sci fi");
        qd.append("year", "1999");
        assert_eq!(qd.urlencode(), "year=2003&genre=sci+fi&year=1999");
        assert!(qd.contains_key("genre"));
    }

    #[test]
    fn test_prefix_escapes_values() {
        let qd = QueryDict::parse("genre=a%26b");
        assert_eq!(qd.prefix_for("genre"), "genre=a%26b&");
    }
}
