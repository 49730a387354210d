//! Configuration checks run by the `check` command and at server startup.
//!
//! Each check inspects [`Settings`] and returns zero or more
//! [`CheckMessage`]s. Errors stop `runserver`; warnings are only logged.

use std::collections::HashSet;
use std::fmt;

use crate::settings::{Settings, ADMIN_PERMISSIONS};

/// Severity level for a check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckLevel {
    /// A potential problem.
    Warning,
    /// A definite problem that must be fixed before serving requests.
    Error,
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A diagnostic message produced by a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMessage {
    /// The severity level.
    pub level: CheckLevel,
    /// What is wrong.
    pub msg: String,
    /// How to fix it.
    pub hint: Option<String>,
    /// A stable identifier, e.g. `security.W001`.
    pub id: &'static str,
}

impl CheckMessage {
    /// Creates a warning-level message.
    pub fn warning(id: &'static str, msg: impl Into<String>, hint: Option<&str>) -> Self {
        Self {
            level: CheckLevel::Warning,
            msg: msg.into(),
            hint: hint.map(String::from),
            id,
        }
    }

    /// Creates an error-level message.
    pub fn error(id: &'static str, msg: impl Into<String>, hint: Option<&str>) -> Self {
        Self {
            level: CheckLevel::Error,
            msg: msg.into(),
            hint: hint.map(String::from),
            id,
        }
    }

    /// Returns `true` for error-level messages.
    pub fn is_error(&self) -> bool {
        self.level == CheckLevel::Error
    }
}

impl fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}: {}", self.id, self.level, self.msg)?;
        if let Some(ref hint) = self.hint {
            write!(f, "\n\tHINT: {hint}")?;
        }
        Ok(())
    }
}

type CheckFn = fn(&Settings) -> Vec<CheckMessage>;

const BUILTIN_CHECKS: &[CheckFn] = &[
    check_secret_key,
    check_allowed_hosts,
    check_page_sizes,
    check_admin_users,
    check_url_prefixes,
];

/// Runs every built-in check against `settings`.
pub fn run_checks(settings: &Settings) -> Vec<CheckMessage> {
    BUILTIN_CHECKS.iter().flat_map(|check| check(settings)).collect()
}

fn check_secret_key(settings: &Settings) -> Vec<CheckMessage> {
    if settings.secret_key.is_empty() && !settings.debug {
        vec![CheckMessage::error(
            "security.E001",
            "secret_key is empty with debug=false.",
            Some("Set secret_key in the settings file or CINEMA_SECRET_KEY."),
        )]
    } else if settings.secret_key.is_empty() {
        vec![CheckMessage::warning(
            "security.W001",
            "secret_key is empty. This is insecure for production.",
            None,
        )]
    } else {
        Vec::new()
    }
}

fn check_allowed_hosts(settings: &Settings) -> Vec<CheckMessage> {
    if !settings.debug && settings.allowed_hosts.is_empty() {
        vec![CheckMessage::error(
            "security.E002",
            "allowed_hosts is empty with debug=false. No request will be served.",
            Some("Set allowed_hosts to the hostnames of the site."),
        )]
    } else {
        Vec::new()
    }
}

fn check_page_sizes(settings: &Settings) -> Vec<CheckMessage> {
    [
        ("movies_per_page", settings.movies_per_page),
        ("filter_per_page", settings.filter_per_page),
        ("admin_list_per_page", settings.admin_list_per_page),
    ]
    .into_iter()
    .filter(|(_, size)| *size == 0)
    .map(|(name, _)| {
        CheckMessage::error("settings.E001", format!("{name} must be greater than zero."), None)
    })
    .collect()
}

fn check_admin_users(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();
    let mut tokens = HashSet::new();

    for user in &settings.admin_users {
        if user.token.is_empty() {
            messages.push(CheckMessage::warning(
                "admin.W001",
                format!("Admin user '{}' has no token and cannot log in.", user.username),
                None,
            ));
        } else if !tokens.insert(user.token.as_str()) {
            messages.push(CheckMessage::error(
                "admin.E001",
                format!("Admin user '{}' shares a token with another user.", user.username),
                Some("Give every admin user a distinct token."),
            ));
        }

        for permission in &user.permissions {
            let action = permission
                .rsplit_once('.')
                .and_then(|(_, codename)| codename.split_once('_'))
                .map_or(permission.as_str(), |(action, _)| action);
            if !ADMIN_PERMISSIONS.contains(&action) {
                messages.push(CheckMessage::warning(
                    "admin.W002",
                    format!(
                        "Admin user '{}' has unknown permission '{permission}'.",
                        user.username
                    ),
                    Some("Use view, add, change, delete or <app>.<action>_<model>."),
                ));
            }
        }
    }

    messages
}

fn check_url_prefixes(settings: &Settings) -> Vec<CheckMessage> {
    [("media_url", &settings.media_url), ("static_url", &settings.static_url)]
        .into_iter()
        .filter(|(_, url)| !(url.starts_with('/') && url.ends_with('/')))
        .map(|(name, url)| {
            CheckMessage::error(
                "settings.E002",
                format!("{name} '{url}' must start and end with a slash."),
                None,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AdminUserSettings;

    #[test]
    fn test_default_settings_only_warn() {
        let messages = run_checks(&Settings::default());
        assert!(!messages.is_empty());
        assert!(messages.iter().all(|m| !m.is_error()));
    }

    #[test]
    fn test_production_without_secret_key_or_hosts() {
        let settings = Settings {
            debug: false,
            ..Settings::default()
        };
        let ids: Vec<_> = run_checks(&settings).iter().map(|m| m.id).collect();
        assert!(ids.contains(&"security.E001"));
        assert!(ids.contains(&"security.E002"));
    }

    #[test]
    fn test_clean_production_settings() {
        let settings = Settings {
            debug: false,
            secret_key: "k".repeat(50),
            allowed_hosts: vec!["films.example".to_string()],
            ..Settings::default()
        };
        assert!(run_checks(&settings).is_empty());
    }

    #[test]
    fn test_duplicate_admin_tokens() {
        let mut settings = Settings::default();
        settings.admin_users = vec![
            AdminUserSettings::superuser("a", "same"),
            AdminUserSettings::superuser("b", "same"),
        ];
        assert!(run_checks(&settings).iter().any(|m| m.id == "admin.E001"));
    }

    #[test]
    fn test_unknown_permission() {
        let mut settings = Settings::default();
        settings.admin_users = vec![AdminUserSettings {
            username: "editor".into(),
            token: "t".into(),
            is_superuser: false,
            permissions: vec!["movies.change_movie".into(), "publish".into()],
        }];
        let unknown: Vec<_> = run_checks(&settings)
            .into_iter()
            .filter(|m| m.id == "admin.W002")
            .collect();
        assert_eq!(unknown.len(), 1);
        assert!(unknown[0].msg.contains("publish"));
    }

    #[test]
    fn test_zero_page_size_and_bad_prefix() {
        let settings = Settings {
            movies_per_page: 0,
            media_url: "media".to_string(),
            ..Settings::default()
        };
        let ids: Vec<_> = run_checks(&settings).iter().map(|m| m.id).collect();
        assert!(ids.contains(&"settings.E001"));
        assert!(ids.contains(&"settings.E002"));
    }

    #[test]
    fn test_message_display() {
        let msg = CheckMessage::error("x.E001", "broken", Some("fix it"));
        assert_eq!(msg.to_string(), "(x.E001) ERROR: broken\n\tHINT: fix it");
    }
}
