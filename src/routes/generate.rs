use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::campaign::CampaignRequest;
use crate::models::job::{GenerateResponse, GenerationResult, Job, JobStatus, JobStatusView};
use crate::services::worker;

/// POST /api/generate — validate a campaign brief and start a generation job.
///
/// Validation failures never create a job. The response returns immediately;
/// the pipeline runs on a spawned task.
pub async fn submit_campaign(
    State(state): State<AppState>,
    Json(payload): Json<CampaignRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    payload.validated().map_err(ApiError::validation)?;
    let campaign = payload.normalized();

    let job = Job::pending(Uuid::new_v4());
    let job_id = job.id;
    state.store.put(job).await;
    metrics::counter!("generation_jobs_total").increment(1);

    tracing::info!(
        %job_id,
        products = campaign.products.len(),
        market = %campaign.target_market,
        "campaign submitted"
    );

    tokio::spawn(worker::run_generation_job(state.clone(), job_id, campaign));

    Ok(Json(GenerateResponse {
        job_id,
        status: JobStatus::Pending,
        message: "Generation started".to_string(),
    }))
}

/// GET /api/status/{job_id} — current job view: status plus progress or error.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusView>, ApiError> {
    let job = state.store.get(job_id).await.ok_or(ApiError::JobNotFound)?;
    Ok(Json(JobStatusView::from(&job)))
}

/// GET /api/images/{job_id} — the assembled result, only once completed.
pub async fn get_job_images(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<GenerationResult>, ApiError> {
    let job = state.store.get(job_id).await.ok_or(ApiError::JobNotFound)?;
    if job.status != JobStatus::Completed {
        return Err(ApiError::NotReady(job.status));
    }
    job.result
        .map(Json)
        .ok_or_else(|| ApiError::Internal("completed job has no result".to_string()))
}
