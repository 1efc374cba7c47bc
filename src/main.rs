// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use omr_grader::clients::{recognition::HttpRecognitionService, results_api::ResultsApi};
use omr_grader::config::Config;
use omr_grader::routes;
use omr_grader::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "omr-grader.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // One HTTP client shared by every upstream call
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .build()
        .expect("Failed to build HTTP client");

    let recognition = HttpRecognitionService::new(
        client.clone(),
        config.qr_service_url.clone(),
        config.omr_service_url.clone(),
    );

    let results_api = config
        .results_api_url
        .clone()
        .map(|url| ResultsApi::new(client.clone(), url));
    if results_api.is_none() {
        tracing::info!("RESULTS_API_URL not set, evaluations will not be persisted");
    }

    tracing::info!(
        "QR service: {}, OMR service: {}, page size: {}",
        config.qr_service_url,
        config.omr_service_url,
        config.page_size
    );

    // Create AppState
    let addr = config.bind_addr;
    let state = AppState {
        config,
        recognition: Arc::new(recognition),
        results_api,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
