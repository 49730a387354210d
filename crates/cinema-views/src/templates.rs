//! Tera templates for the public pages.
//!
//! The pages ship inside the crate. A file with the same name in one of the
//! configured template directories replaces the built-in one; the first
//! directory that has it wins. HTML autoescaping stays on for every page.

use std::path::PathBuf;

use cinema_core::{CinemaError, CinemaResult};
use tera::{Context, Tera};

/// The page templates, by name.
pub const BUILTIN_TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("templates/base.html")),
    ("movie_list.html", include_str!("templates/movie_list.html")),
    ("movie_detail.html", include_str!("templates/movie_detail.html")),
    ("actor.html", include_str!("templates/actor.html")),
    ("error.html", include_str!("templates/error.html")),
];

/// The compiled set of page templates.
#[derive(Debug, Clone)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compiles the built-in templates, replacing any that exist in `dirs`.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::IoError`] if an override cannot be read and
    /// [`CinemaError::TemplateError`] if a template does not compile.
    pub fn new(dirs: &[PathBuf]) -> CinemaResult<Self> {
        let mut sources = Vec::with_capacity(BUILTIN_TEMPLATES.len());
        for (name, builtin) in BUILTIN_TEMPLATES {
            let source = match dirs.iter().map(|dir| dir.join(name)).find(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(template = name, path = %path.display(), "using template override");
                    std::fs::read_to_string(path)?
                }
                None => builtin.to_string(),
            };
            sources.push((name, source));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources).map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Compiles the built-in templates only.
    pub fn builtin() -> CinemaResult<Self> {
        Self::new(&[])
    }

    /// Renders the named template.
    ///
    /// # Errors
    ///
    /// Returns [`CinemaError::TemplateError`] for unknown templates and
    /// rendering failures.
    pub fn render(&self, name: &str, context: &Context) -> CinemaResult<String> {
        self.tera.render(name, context).map_err(template_error)
    }
}

/// Flattens a Tera error and its sources into one message.
fn template_error(err: tera::Error) -> CinemaError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    CinemaError::TemplateError(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_context(status: u16, message: &str) -> Context {
        let mut ctx = Context::new();
        ctx.insert("site_title", "Django Movies");
        ctx.insert("status", &status);
        ctx.insert("message", message);
        ctx
    }

    #[test]
    fn test_builtin_templates_compile() {
        let templates = Templates::builtin().unwrap();
        let html = templates
            .render("error.html", &error_context(404, "No movie found"))
            .unwrap();
        assert!(html.contains("404"));
        assert!(html.contains("No movie found"));
    }

    #[test]
    fn test_autoescape() {
        let templates = Templates::builtin().unwrap();
        let html = templates
            .render("error.html", &error_context(400, "<script>"))
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_unknown_template() {
        let templates = Templates::builtin().unwrap();
        let err = templates.render("missing.html", &Context::new()).unwrap_err();
        assert!(matches!(err, CinemaError::TemplateError(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let templates = Templates::builtin().unwrap();
        let err = templates.render("error.html", &Context::new()).unwrap_err();
        assert!(matches!(err, CinemaError::TemplateError(_)));
    }

    #[test]
    fn test_override_from_directory() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("error.html"), "first {{ status }}").unwrap();
        std::fs::write(second.path().join("error.html"), "second {{ status }}").unwrap();

        let templates =
            Templates::new(&[first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
        let html = templates
            .render("error.html", &error_context(500, "boom"))
            .unwrap();
        assert_eq!(html, "first 500");
    }

    #[test]
    fn test_broken_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("error.html"), "{% if %}").unwrap();
        let err = Templates::new(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, CinemaError::TemplateError(_)));
    }
}
