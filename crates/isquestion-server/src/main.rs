//! isquestion Server
//!
//! HTTP service answering whether a sentence is a question.
//!
//! Model artifacts and the lexicon load once before the listener binds; a
//! load failure aborts startup.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

mod config;
mod routes;
mod state;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "isquestion-server")]
#[command(about = "Question classification service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ISQUESTION_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Model artifact directory
    #[arg(short, long, env = "ISQUESTION_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    /// Lexicon file replacing the built-in word lists
    #[arg(long, env = "ISQUESTION_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long, env = "ISQUESTION_LISTEN")]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "ISQUESTION_PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting isquestion server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    info!(
        artifacts = %config.artifacts_dir.display(),
        lexicon = ?config.lexicon_path,
        max_body_bytes = config.max_body_bytes,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Load lexicon and model artifacts
    let addr: SocketAddr = config.bind_address().parse()?;
    let state = state::AppState::load(config, metrics_handle)?;

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("isquestion=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("isquestion=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "isquestion_requests_total",
        "Total number of classification requests"
    );
    metrics::describe_counter!(
        "isquestion_verdicts_total",
        "Classification verdicts by outcome"
    );
    metrics::describe_histogram!(
        "isquestion_inference_latency_us",
        metrics::Unit::Microseconds,
        "Guard plus model latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
