// Main entry point for the analysis server

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analysis::{AnalysisPipeline, DomainVerifier, PipelineConfig, ProgressChannel};

mod clients;
mod config;
mod routes;
mod sse;

use clients::{FirecrawlExtractor, OpenAiClient};
use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,analysis=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting shipping-incentive analysis server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Wire collaborators into the pipeline
    let openai = Arc::new(OpenAiClient::new(config.openai_api_key.clone()));
    let extractor = Arc::new(
        FirecrawlExtractor::new(config.firecrawl_api_key.clone())
            .context("Failed to create extraction client")?,
    );
    let progress = ProgressChannel::new();

    let pipeline = Arc::new(AnalysisPipeline::new(
        openai.clone(),
        extractor,
        openai.clone(),
        openai,
        DomainVerifier::new(),
        progress.clone(),
        PipelineConfig::default(),
    ));

    let app = routes::router(AppState { pipeline, progress });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
