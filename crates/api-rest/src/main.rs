//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the journal REST API on its own.
//!
//! ## Intended use
//! Useful during development when only the API (with Swagger UI at `/docs`) is needed. The
//! workspace's main `ambu-run` binary serves the same router and additionally loads `.env`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Ambulance Assistant REST API server
///
/// See [`api_rest::RestConfig::from_env`] for the environment variables read.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = api_rest::RestConfig::from_env()?;
    if !cfg.core.journals_dir().exists() {
        anyhow::bail!(
            "Journals directory does not exist: {}",
            cfg.core.journals_dir().display()
        );
    }

    api_rest::serve(cfg).await
}
