//! Bearer-token authentication for the admin API.
//!
//! Staff accounts are configured in [`Settings::admin_users`]. A request is
//! authenticated when its `Authorization: Bearer <token>` header matches one
//! of them; the matching account is then checked against the model
//! permissions (`view`, `add`, `change`, `delete`) each endpoint needs.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use cinema_core::{AdminUserSettings, CinemaError, CinemaResult, Settings};

use crate::model_admin::ModelAdmin;

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` if the header is missing, is not valid ASCII, or uses a
/// different scheme.
///
/// ```
/// use axum::http::HeaderMap;
/// use cinema_admin::auth::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// assert_eq!(bearer_token(&headers), None);
/// headers.insert("authorization", "Bearer abc123".parse().unwrap());
/// assert_eq!(bearer_token(&headers), Some("abc123"));
/// headers.insert("authorization", "Basic abc123".parse().unwrap());
/// assert_eq!(bearer_token(&headers), None);
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// An authenticated staff account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffUser(pub AdminUserSettings);

impl StaffUser {
    /// The username recorded in the admin log.
    pub fn username(&self) -> &str {
        &self.0.username
    }

    /// Returns `true` if the account holds `action` on the admin's model.
    pub fn has_permission(&self, admin: &ModelAdmin, action: &str) -> bool {
        self.0
            .has_permission(&admin.app_label, &admin.model_name, action)
    }

    /// Fails with `PermissionDenied` unless the account holds `action`.
    pub fn require(&self, admin: &ModelAdmin, action: &str) -> CinemaResult<()> {
        if self.has_permission(admin, action) {
            Ok(())
        } else {
            tracing::warn!(
                user = %self.0.username,
                model = %admin.model_key(),
                action,
                "admin permission denied"
            );
            Err(CinemaError::PermissionDenied(format!(
                "You do not have permission to {action} {}.",
                admin.verbose_name_plural
            )))
        }
    }

    /// Returns the subset of `view`/`add`/`change`/`delete` the account holds.
    pub fn permissions_for(&self, admin: &ModelAdmin) -> Vec<&'static str> {
        cinema_core::settings::ADMIN_PERMISSIONS
            .into_iter()
            .filter(|action| self.has_permission(admin, action))
            .collect()
    }
}

/// Resolves the staff account for a request.
pub fn authenticate(settings: &Settings, headers: &HeaderMap) -> CinemaResult<StaffUser> {
    let token = bearer_token(headers).ok_or_else(|| {
        CinemaError::Unauthorized("Authentication credentials were not provided.".into())
    })?;
    settings
        .admin_user_by_token(token)
        .cloned()
        .map(StaffUser)
        .ok_or_else(|| CinemaError::Unauthorized("Invalid token.".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings
            .admin_users
            .push(AdminUserSettings::superuser("root", "root-token"));
        settings.admin_users.push(AdminUserSettings {
            username: "editor".into(),
            token: "editor-token".into(),
            is_superuser: false,
            permissions: vec!["view".into(), "movies.change_movie".into()],
        });
        settings
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_authenticate_known_token() {
        let user = authenticate(&settings(), &headers("Bearer root-token")).unwrap();
        assert_eq!(user.username(), "root");
    }

    #[test]
    fn test_authenticate_missing_header() {
        let err = authenticate(&settings(), &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_authenticate_unknown_token() {
        let err = authenticate(&settings(), &headers("Bearer nope")).unwrap_err();
        assert!(matches!(err, CinemaError::Unauthorized(_)));
    }

    #[test]
    fn test_require_permission() {
        let editor = authenticate(&settings(), &headers("Bearer editor-token")).unwrap();
        let movie = ModelAdmin::new("movies", "movie", "movies_movie");
        let genre = ModelAdmin::new("movies", "genre", "movies_genre");
        assert!(editor.require(&movie, "change").is_ok());
        assert!(editor.require(&genre, "view").is_ok());
        let err = editor.require(&genre, "delete").unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(editor.permissions_for(&movie), vec!["view", "change"]);
    }
}
