use std::path::{Component, Path, PathBuf};

use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::compliance::{ComplianceCheckRequest, ComplianceVerdict};

/// POST /api/check-compliance — verify brand presence in generated images.
///
/// Stateless: no job tracking. Input validation and file resolution happen
/// before any upstream call.
pub async fn check_compliance(
    State(state): State<AppState>,
    Json(request): Json<ComplianceCheckRequest>,
) -> Result<Json<ComplianceVerdict>, ApiError> {
    request.validate().map_err(|report| {
        let detail = report
            .iter()
            .map(|(path, error)| format!("{path}: {error}"))
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::InvalidInput(detail)
    })?;

    let mut images = Vec::with_capacity(request.image_paths.len());
    for relative in &request.image_paths {
        let path = resolve_output_path(&state.outputs_dir, relative)?;
        let bytes =
            std::fs::read(&path).map_err(|_| ApiError::ImageNotFound(relative.clone()))?;
        images.push(bytes);
    }

    tracing::info!(
        brand = %request.brand_name,
        images = images.len(),
        "running compliance check"
    );

    let verdict = state
        .vision
        .check_compliance(
            &images,
            &request.brand_name,
            request.campaign_message.as_deref(),
        )
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    metrics::counter!("compliance_checks_total").increment(1);
    tracing::info!(status = ?verdict.compliance_status, "compliance check completed");
    Ok(Json(verdict))
}

/// Resolve a client-supplied relative path inside the outputs directory.
/// Absolute paths and parent traversal are rejected.
fn resolve_output_path(outputs_dir: &Path, relative: &str) -> Result<PathBuf, ApiError> {
    let candidate = Path::new(relative);
    if candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ApiError::InvalidInput(format!(
            "invalid image path: {relative}"
        )));
    }
    let path = outputs_dir.join(candidate);
    if !path.is_file() {
        return Err(ApiError::ImageNotFound(relative.to_string()));
    }
    Ok(path)
}
