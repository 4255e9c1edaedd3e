pub mod compliance;
pub mod generate;
pub mod health;
pub mod metrics;

use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::app_state::AppState;

/// Build the application router: API endpoints, the embedded UI, and the
/// static outputs mount.
pub fn router(state: AppState) -> Router {
    let outputs = ServeDir::new(&state.outputs_dir);

    Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../../static/index.html")) }))
        // API endpoints
        .route("/health", get(health::health_check))
        .route("/api/generate", post(generate::submit_campaign))
        .route("/api/status/{job_id}", get(generate::get_job_status))
        .route("/api/images/{job_id}", get(generate::get_job_images))
        .route("/api/check-compliance", post(compliance::check_compliance))
        // Generated artifacts
        .nest_service("/outputs", outputs)
        .with_state(state)
}
