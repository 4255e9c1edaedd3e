use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use adcraft::app_state::AppState;
use adcraft::config::AppConfig;
use adcraft::routes;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing adcraft server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "generation_jobs_total",
        "Total campaign generation jobs submitted"
    );
    metrics::describe_counter!(
        "generation_jobs_completed",
        "Total campaign generation jobs completed"
    );
    metrics::describe_counter!(
        "generation_jobs_failed",
        "Total campaign generation jobs that failed"
    );
    metrics::describe_histogram!(
        "generation_job_seconds",
        "Time to run a campaign generation job"
    );
    metrics::describe_counter!(
        "generation_images_total",
        "Total banner images generated"
    );
    metrics::describe_counter!(
        "compliance_checks_total",
        "Total brand compliance checks performed"
    );

    // Ensure the outputs directory exists before serving it
    std::fs::create_dir_all(&config.outputs_dir).expect("Failed to create outputs directory");

    // Build shared application state (job store + upstream clients)
    let state = AppState::from_config(&config).expect("Failed to initialize services");

    let bind_addr = config.bind_addr.clone();

    // Build API routes
    let app = routes::router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1 MB limit, JSON bodies only

    tracing::info!("Starting adcraft on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
