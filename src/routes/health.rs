use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub jobs_tracked: usize,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub outputs: ComponentHealth,
    pub screening: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// GET /health — dependency status for the service.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    // Outputs directory must exist and be writable for generation to succeed.
    let outputs = match std::fs::create_dir_all(&state.outputs_dir) {
        Ok(()) => ComponentHealth {
            status: "ok".to_string(),
            detail: Some(state.outputs_dir.display().to_string()),
        },
        Err(e) => ComponentHealth {
            status: "error".to_string(),
            detail: Some(e.to_string()),
        },
    };

    let screening = ComponentHealth {
        status: if state.screen.is_empty() { "empty" } else { "ok" }.to_string(),
        detail: Some(format!("{} terms loaded", state.screen.len())),
    };

    let healthy = outputs.status == "ok";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs_tracked: state.store.list().await.len(),
        checks: HealthChecks { outputs, screening },
    };

    (status_code, Json(response))
}
