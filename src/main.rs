//! Fraud Scoring API - Main Entry Point
//!
//! Loads the fitted artifacts once and serves predictions over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use fraud_scoring_api::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::{MetricsReporter, ServiceMetrics},
    models::{inference::InferenceEngine, loader::ArtifactLoader},
    server::{router, AppState},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fraud-scoring-api", version, about)]
struct Cli {
    /// Configuration file (optional, TOML)
    #[arg(long, env = "FRAUD_API_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the artifact directory
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load_from_path(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.artifacts_dir {
        config.artifacts.dir = Some(dir);
    }

    init_logging(&config.logging)?;
    info!("Starting Fraud Scoring API");

    // Load artifacts; a failure degrades the service instead of stopping it
    let loader = ArtifactLoader::new(&config.artifacts);
    let engine = loader.load_or_degrade().map(InferenceEngine::new);
    match &engine {
        Some(engine) => info!(
            features = engine.feature_names().len(),
            classifier = engine.classifier_name(),
            "Inference engine initialized"
        ),
        None => warn!("Serving in degraded mode: /predict will fail until restart"),
    }

    let metrics = Arc::new(ServiceMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = router(AppState::new(engine, metrics.clone()), config.server.cors);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, cors = config.server.cors, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down...");
    metrics.log_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
