use anyhow::{Context, Result};
use api::config::ServerConfig;
use api::startup::build_router;
use api::AppState;
use blueprint_estimator::{EstimationService, EstimatorConfig, GeminiService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let estimator_config = EstimatorConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;

    log::info!(
        "Using model {} with a {}s timeout; staging uploads in {}",
        estimator_config.gemini.model,
        estimator_config.gemini.timeout.as_secs(),
        estimator_config.upload_dir.display()
    );

    let gemini = Arc::new(GeminiService::new(estimator_config.gemini)?);
    let estimator = Arc::new(EstimationService::new(gemini, estimator_config.upload_dir));

    let app = build_router(AppState::new(estimator), server_config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
