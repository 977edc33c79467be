use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Ambulance Assistant journal service
///
/// Loads `.env`, then serves the journal REST API (Swagger UI at `/docs`).
///
/// # Environment Variables
/// - `AMBU_REST_ADDR`: REST server address (default: "0.0.0.0:5000"); `PORT` overrides the port
/// - `JOURNALS_DIR`: Directory of patient journals (default: "data/journals")
/// - `EMERGENCY_LOGS_DIR`: Directory of emergency call logs (default: "data/emergency_call_logs")
/// - `PATIENT_IMAGES_DIR`: Directory for patient photos (default: "data/patient_images")
/// - `SEARCH_THRESHOLD`, `SEARCH_MAX_MATCHES`: Fuzzy search tuning (default: 65, 3)
/// - `AMBU_CORS_ORIGINS`: Extra allowed CORS origins, comma-separated
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ambu=info".parse()?)
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

    tracing::info!(
        journals = %cfg.core.journals_dir().display(),
        emergency_logs = %cfg.core.emergency_logs_dir().display(),
        "++ Starting Ambulance Assistant"
    );

    api_rest::serve(cfg).await
}
