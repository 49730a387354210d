//! The `cinema` management binary.
//!
//! ```bash
//! cinema --settings cinema.toml migrate
//! cinema --settings cinema.toml loaddata fixtures/catalog.json
//! cinema --settings cinema.toml runserver --port 8000
//! ```

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = cinema::cli::default_registry();
    let matches = registry.build_cli().get_matches();

    let settings_path = matches.get_one::<String>("settings").map(String::as_str);
    let settings = cinema::cli::load_settings(settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.unwrap_or("the environment")))?;
    cinema::core::logging::setup_logging(&settings);
    tracing::debug!(database = %settings.database, debug = settings.debug, "settings loaded");

    registry.execute(&matches, &settings).await?;
    Ok(())
}
