//! Settings for the cinema-rs application.
//!
//! [`Settings`] holds every configuration value the server, the admin API,
//! and the management commands need. All fields have defaults suitable for
//! local development, so an empty settings file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Admin permission names accepted in [`AdminUserSettings::permissions`].
pub const ADMIN_PERMISSIONS: [&str; 4] = ["view", "add", "change", "delete"];

/// A staff account allowed to use the admin API.
///
/// Accounts are configured statically; the admin authenticates requests by
/// matching the bearer token against `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminUserSettings {
    /// Display name recorded in the admin log.
    pub username: String,
    /// Bearer token presented in the `Authorization` header.
    pub token: String,
    /// Superusers hold every permission on every model.
    pub is_superuser: bool,
    /// Granted permissions. Entries are either a bare action (`"change"`)
    /// applying to all models, or `"<app>.<action>_<model>"`
    /// (e.g. `"movies.change_movie"`).
    pub permissions: Vec<String>,
}

impl Default for AdminUserSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            token: String::new(),
            is_superuser: false,
            permissions: Vec::new(),
        }
    }
}

impl AdminUserSettings {
    /// Creates a superuser account with the given token.
    pub fn superuser(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            is_superuser: true,
            permissions: Vec::new(),
        }
    }

    /// Returns `true` if the account holds `action` on `app.model`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cinema_core::settings::AdminUserSettings;
    ///
    /// let editor = AdminUserSettings {
    ///     username: "editor".into(),
    ///     token: "t".into(),
    ///     is_superuser: false,
    ///     permissions: vec!["view".into(), "movies.change_movie".into()],
    /// };
    /// assert!(editor.has_permission("movies", "genre", "view"));
    /// assert!(editor.has_permission("movies", "movie", "change"));
    /// assert!(!editor.has_permission("movies", "genre", "change"));
    /// ```
    pub fn has_permission(&self, app: &str, model: &str, action: &str) -> bool {
        if self.is_superuser {
            return true;
        }
        let codename = format!("{app}.{action}_{model}");
        self.permissions
            .iter()
            .any(|p| p == action || *p == codename)
    }
}

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use cinema_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.site_header, "Django Movies");
/// assert_eq!(settings.media_url, "/media/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The secret key. Required outside of debug mode.
    pub secret_key: String,
    /// Hostnames that this application can serve. Empty allows any host
    /// in debug mode.
    pub allowed_hosts: Vec<String>,

    // ── Database ─────────────────────────────────────────────────────

    /// Path to the `SQLite` database file, or `":memory:"`.
    pub database: String,

    // ── Static files & media ─────────────────────────────────────────

    /// URL prefix for static files.
    pub static_url: String,
    /// Directory static files are served from.
    pub static_root: Option<PathBuf>,
    /// URL prefix for uploaded media (posters, photos, stills).
    pub media_url: String,
    /// Directory media files are served from.
    pub media_root: Option<PathBuf>,

    // ── Templates ────────────────────────────────────────────────────

    /// Directories searched for template overrides before the built-in templates.
    pub template_dirs: Vec<PathBuf>,

    // ── Pagination ───────────────────────────────────────────────────

    /// Movies per page on the movie list.
    pub movies_per_page: usize,
    /// Movies per page on the filter results.
    pub filter_per_page: usize,
    /// Default rows per page in admin change lists.
    pub admin_list_per_page: usize,

    // ── Admin ────────────────────────────────────────────────────────

    /// Heading shown by the admin.
    pub site_header: String,
    /// Title shown by the admin.
    pub site_title: String,
    /// Staff accounts for the admin API.
    pub admin_users: Vec<AdminUserSettings>,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "debug", "cinema_views=trace").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            secret_key: String::new(),
            allowed_hosts: Vec::new(),

            database: "db.sqlite3".to_string(),

            static_url: "/static/".to_string(),
            static_root: None,
            media_url: "/media/".to_string(),
            media_root: None,

            template_dirs: Vec::new(),

            movies_per_page: 6,
            filter_per_page: 2,
            admin_list_per_page: 100,

            site_header: "Django Movies".to_string(),
            site_title: "Django Movies".to_string(),
            admin_users: Vec::new(),

            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Looks up the staff account owning `token`.
    pub fn admin_user_by_token(&self, token: &str) -> Option<&AdminUserSettings> {
        if token.is_empty() {
            return None;
        }
        self.admin_users.iter().find(|u| u.token == token)
    }

    /// Returns `true` if `host` (without port) may be served.
    pub fn is_host_allowed(&self, host: &str) -> bool {
        let host = match host.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                name
            }
            _ => host,
        };
        if self.allowed_hosts.is_empty() {
            return self.debug && matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "");
        }
        self.allowed_hosts.iter().any(|pattern| {
            pattern == "*"
                || pattern == host
                || pattern
                    .strip_prefix('.')
                    .is_some_and(|suffix| host == suffix || host.ends_with(pattern.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert!(s.secret_key.is_empty());
        assert_eq!(s.database, "db.sqlite3");
        assert_eq!(s.static_url, "/static/");
        assert_eq!(s.media_url, "/media/");
        assert_eq!(s.movies_per_page, 6);
        assert_eq!(s.filter_per_page, 2);
        assert_eq!(s.site_title, "Django Movies");
        assert_eq!(s.log_level, "info");
        assert!(s.admin_users.is_empty());
    }

    #[test]
    fn test_admin_user_by_token() {
        let mut s = Settings::default();
        s.admin_users.push(AdminUserSettings::superuser("root", "secret-token"));
        assert_eq!(
            s.admin_user_by_token("secret-token").map(|u| u.username.as_str()),
            Some("root")
        );
        assert!(s.admin_user_by_token("other").is_none());
        assert!(s.admin_user_by_token("").is_none());
    }

    #[test]
    fn test_superuser_has_every_permission() {
        let user = AdminUserSettings::superuser("root", "t");
        for action in ADMIN_PERMISSIONS {
            assert!(user.has_permission("movies", "movie", action));
        }
    }

    #[test]
    fn test_codename_permission_is_model_scoped() {
        let user = AdminUserSettings {
            permissions: vec!["movies.delete_review".to_string()],
            ..AdminUserSettings::default()
        };
        assert!(user.has_permission("movies", "review", "delete"));
        assert!(!user.has_permission("movies", "movie", "delete"));
        assert!(!user.has_permission("movies", "review", "view"));
    }

    #[test]
    fn test_allowed_hosts_debug_default() {
        let s = Settings::default();
        assert!(s.is_host_allowed("localhost:8000"));
        assert!(s.is_host_allowed("127.0.0.1"));
        assert!(!s.is_host_allowed("example.com"));
    }

    #[test]
    fn test_allowed_hosts_patterns() {
        let s = Settings {
            debug: false,
            allowed_hosts: vec![".example.com".to_string(), "films.test".to_string()],
            ..Settings::default()
        };
        assert!(s.is_host_allowed("example.com"));
        assert!(s.is_host_allowed("www.example.com"));
        assert!(s.is_host_allowed("films.test:443"));
        assert!(!s.is_host_allowed("evil.com"));
    }

    #[test]
    fn test_wildcard_host() {
        let s = Settings {
            debug: false,
            allowed_hosts: vec!["*".to_string()],
            ..Settings::default()
        };
        assert!(s.is_host_allowed("anything.example"));
    }
}
