//! The application server.
//!
//! [`CinemaApp`] assembles the whole site: the public routes, the admin API
//! nested under its prefix, media and static files, a host check and request
//! tracing.
//!
//! ```rust,no_run
//! use cinema_core::Settings;
//! use cinema_db::Database;
//! use cinema_views::server::CinemaApp;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let db = Database::open(&settings.database)?;
//! cinema_db::schema::migrate(&db, false).await?;
//! CinemaApp::catalog(settings, db).run("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use cinema_admin::site::AdminSite;
use cinema_core::{CinemaError, CinemaResult, Settings};
use cinema_db::Database;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::urls::public_router;
use crate::views::AppState;

/// The assembled site.
pub struct CinemaApp {
    settings: Settings,
    db: Database,
    admin: Option<AdminSite>,
}

impl CinemaApp {
    /// Creates an app serving only the public routes.
    pub const fn new(settings: Settings, db: Database) -> Self {
        Self {
            settings,
            db,
            admin: None,
        }
    }

    /// Creates the movie catalog: public routes plus the admin with every
    /// catalog model registered.
    pub fn catalog(settings: Settings, db: Database) -> Self {
        let mut site = AdminSite::new(settings.clone());
        cinema_admin::movies::register(&mut site);
        Self::new(settings, db).admin(site)
    }

    /// Mounts an admin site under its URL prefix.
    #[must_use]
    pub fn admin(mut self, site: AdminSite) -> Self {
        self.admin = Some(site);
        self
    }

    /// Returns the settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns `true` if an admin site is mounted.
    pub const fn has_admin(&self) -> bool {
        self.admin.is_some()
    }

    /// Converts the app into an axum router.
    ///
    /// # Errors
    ///
    /// Returns an error if the page templates cannot be loaded or the admin
    /// prefix is not a usable mount point.
    pub fn into_axum_router(self) -> CinemaResult<Router> {
        let state = Arc::new(AppState::new(self.settings.clone(), self.db.clone())?);
        let mut router = public_router(state)?;

        if let Some(site) = self.admin {
            let prefix = site.url_prefix_str().to_string();
            if !prefix.starts_with('/') || prefix.len() < 2 {
                return Err(CinemaError::ConfigurationError(format!(
                    "Admin prefix must be a non-root path, got '{prefix}'"
                )));
            }
            router = router.nest(&prefix, site.into_axum_router(self.db.clone()));
        }

        if let Some(root) = &self.settings.media_root {
            router = serve_files(router, &self.settings.media_url, root);
        }
        if let Some(root) = &self.settings.static_root {
            router = serve_files(router, &self.settings.static_url, root);
        }

        let settings = Arc::new(self.settings);
        Ok(router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(settings, check_host)),
        ))
    }

    /// Serves the app on `addr` until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the router cannot be built, the address cannot be
    /// bound, or the server fails.
    pub async fn run(self, addr: &str) -> CinemaResult<()> {
        let debug = self.settings.debug;
        let router = self.into_axum_router()?;
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            CinemaError::ConfigurationError(format!("Failed to bind to {addr}: {e}"))
        })?;

        if debug {
            tracing::info!("Starting development server at http://{addr}/");
        } else {
            tracing::info!(addr, "listening");
        }

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CinemaError::InternalServerError(format!("Server error: {e}")))?;

        tracing::info!("server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for CinemaApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CinemaApp")
            .field("database", &self.db.path())
            .field("has_admin", &self.admin.is_some())
            .field("debug", &self.settings.debug)
            .finish()
    }
}

/// Mounts `root` at `url`. Absolute URLs (a CDN) are left to the web server.
fn serve_files(router: Router, url: &str, root: &Path) -> Router {
    let mount = url.trim_end_matches('/');
    if !mount.starts_with('/') || mount.is_empty() {
        tracing::warn!(url, "not serving files for a non-local URL");
        return router;
    }
    tracing::debug!(url = mount, root = %root.display(), "serving files");
    router.nest_service(mount, ServeDir::new(root))
}

/// Rejects requests whose `Host` is not in `allowed_hosts`.
async fn check_host(
    State(settings): State<Arc<Settings>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default()
        .to_string();

    if settings.is_host_allowed(&host) {
        return next.run(request).await;
    }
    tracing::warn!(host, "rejected request for a disallowed host");
    (
        StatusCode::BAD_REQUEST,
        format!("Invalid HTTP_HOST header: '{host}'."),
    )
        .into_response()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
