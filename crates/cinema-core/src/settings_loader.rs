//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `CINEMA_DEBUG` | `debug` |
//! | `CINEMA_SECRET_KEY` | `secret_key` |
//! | `CINEMA_ALLOWED_HOSTS` | `allowed_hosts` (comma-separated) |
//! | `CINEMA_DATABASE` | `database` |
//! | `CINEMA_LOG_LEVEL` | `log_level` |
//! | `CINEMA_MEDIA_URL` / `CINEMA_MEDIA_ROOT` | `media_url` / `media_root` |
//! | `CINEMA_STATIC_URL` / `CINEMA_STATIC_ROOT` | `static_url` / `static_root` |
//! | `CINEMA_ADMIN_TOKEN` | token of the `admin` superuser (created if missing) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use cinema_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("cinema.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::CinemaError;
use crate::settings::{AdminUserSettings, Settings};

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, CinemaError> {
    toml::from_str(toml_str)
        .map_err(|e| CinemaError::ConfigurationError(format!("Invalid settings: {e}")))
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, CinemaError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        CinemaError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, CinemaError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `CINEMA_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Applies overrides read through `lookup`, which maps an environment
/// variable name to its value.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CINEMA_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("CINEMA_SECRET_KEY") {
        settings.secret_key = val;
    }

    if let Some(val) = lookup("CINEMA_ALLOWED_HOSTS") {
        settings.allowed_hosts = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(val) = lookup("CINEMA_DATABASE") {
        settings.database = val;
    }

    if let Some(val) = lookup("CINEMA_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("CINEMA_MEDIA_URL") {
        settings.media_url = val;
    }

    if let Some(val) = lookup("CINEMA_MEDIA_ROOT") {
        settings.media_root = Some(PathBuf::from(val));
    }

    if let Some(val) = lookup("CINEMA_STATIC_URL") {
        settings.static_url = val;
    }

    if let Some(val) = lookup("CINEMA_STATIC_ROOT") {
        settings.static_root = Some(PathBuf::from(val));
    }

    if let Some(token) = lookup("CINEMA_ADMIN_TOKEN").filter(|t| !t.is_empty()) {
        match settings.admin_users.iter_mut().find(|u| u.username == "admin") {
            Some(user) => user.token = token,
            None => settings
                .admin_users
                .push(AdminUserSettings::superuser("admin", token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            secret_key = "my-secret-key"
            debug = false
            database = "/var/lib/cinema/db.sqlite3"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.secret_key, "my-secret-key");
        assert!(!settings.debug);
        assert_eq!(settings.database, "/var/lib/cinema/db.sqlite3");
        // Defaults preserved
        assert_eq!(settings.static_url, "/static/");
        assert_eq!(settings.movies_per_page, 6);
    }

    #[test]
    fn test_from_toml_str_admin_users() {
        let toml = r#"
            [[admin_users]]
            username = "editor"
            token = "editor-token"
            permissions = ["view", "movies.change_movie"]

            [[admin_users]]
            username = "root"
            token = "root-token"
            is_superuser = true
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.admin_users.len(), 2);
        assert_eq!(settings.admin_users[0].permissions.len(), 2);
        assert!(!settings.admin_users[0].is_superuser);
        assert!(settings.admin_users[1].is_superuser);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert!(settings.secret_key.is_empty());
        assert_eq!(settings.site_header, "Django Movies");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("this is not = [valid toml");
        assert!(matches!(result, Err(CinemaError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("movies_per_page = \"six\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cinema.toml");
        std::fs::write(&path, "media_url = \"/uploads/\"\ntemplate_dirs = [\"templates\"]\n")
            .unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert_eq!(settings.media_url, "/uploads/");
        assert_eq!(settings.template_dirs, vec![PathBuf::from("templates")]);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/cinema.toml");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    // ── Environment overrides ───────────────────────────────────────

    #[test]
    fn test_overrides_basic() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("CINEMA_DEBUG", "false"),
                ("CINEMA_SECRET_KEY", "s3cret"),
                ("CINEMA_ALLOWED_HOSTS", "example.com, www.example.com,"),
                ("CINEMA_DATABASE", ":memory:"),
                ("CINEMA_MEDIA_ROOT", "/srv/media"),
            ]),
        );
        assert!(!settings.debug);
        assert_eq!(settings.secret_key, "s3cret");
        assert_eq!(settings.allowed_hosts, vec!["example.com", "www.example.com"]);
        assert_eq!(settings.database, ":memory:");
        assert_eq!(settings.media_root, Some(PathBuf::from("/srv/media")));
    }

    #[test]
    fn test_admin_token_override_creates_superuser() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, env(&[("CINEMA_ADMIN_TOKEN", "tok")]));
        assert_eq!(settings.admin_users.len(), 1);
        assert!(settings.admin_users[0].is_superuser);
        assert_eq!(settings.admin_users[0].token, "tok");
    }

    #[test]
    fn test_admin_token_override_replaces_existing_token() {
        let mut settings = Settings::default();
        settings
            .admin_users
            .push(AdminUserSettings::superuser("admin", "old"));
        apply_overrides(&mut settings, env(&[("CINEMA_ADMIN_TOKEN", "new")]));
        assert_eq!(settings.admin_users.len(), 1);
        assert_eq!(settings.admin_users[0].token, "new");
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, env(&[]));
        assert!(settings.debug);
        assert!(settings.admin_users.is_empty());
    }

    #[test]
    fn test_optional_roots() {
        let settings = from_toml_str("static_root = \"/srv/static\"").unwrap();
        assert_eq!(settings.static_root, Some(PathBuf::from("/srv/static")));
        assert_eq!(settings.media_root, None);
    }
}
