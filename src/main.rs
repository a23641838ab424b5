//! Sentiment Service - Main Entry Point
//!
//! Fetches the model and tokenizer, loads them, then serves `POST /predict`.

use anyhow::{Context, Result};
use sentiment_service::{
    config::AppConfig,
    metrics::{MetricsReporter, ServiceMetrics},
    server::{self, AppState},
    startup, GcsClient,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("sentiment_service={}", config.logging.level).parse()?);

    if config.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config)?;

    info!("Starting Sentiment Service");
    info!(
        bucket = %config.storage.bucket,
        model = %config.artifacts.model.key,
        tokenizer = %config.artifacts.tokenizer.key,
        "Configuration loaded successfully"
    );

    // Fetch and load artifacts; any failure aborts startup
    let store = GcsClient::new(&config.storage).context("Failed to create object store client")?;
    let service = startup::bootstrap(&config, store)
        .await
        .context("Startup failed")?;

    let metrics = Arc::new(ServiceMetrics::new());
    let state = Arc::new(AppState::new(service, metrics.clone()));

    // Log a summary every 60 seconds
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 60);
        reporter.start().await;
    });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Listening for prediction requests");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(server::shutdown_signal())
        .await
        .context("Server error")?;

    info!("Sentiment Service shutting down...");
    metrics.print_summary();

    Ok(())
}
