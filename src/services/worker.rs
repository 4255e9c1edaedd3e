//! Generation worker: the background pipeline for one campaign job.
//!
//! Steps run strictly in order: prohibited-term screening, brand name and
//! campaign message generation (when absent from the brief), asset loading,
//! prompt optimization with localization, then one image per aspect ratio.
//! Progress lands in the job store after each step; the job reaches exactly
//! one terminal state.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use image::GenericImageView;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::campaign::CampaignRequest;
use crate::models::job::{
    AspectRatio, FailureKind, GenerationResult, ImageArtifact, Job, JobError, Progress,
};
use crate::services::assets::AssetsLoader;
use crate::services::screening::TermScreen;

const BACKOFF_BASE_SECS: u64 = 1;

/// Upstream errors that may be worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::services::prompt::LlmError {
    fn is_retryable(&self) -> bool {
        self.is_retryable()
    }
}

impl Retryable for crate::services::image_gen::ImageGenError {
    fn is_retryable(&self) -> bool {
        self.is_retryable()
    }
}

/// Run `op` up to `max_attempts` times with exponential backoff. Only
/// transient failures are retried; policy rejections surface immediately.
pub async fn with_retries<T, E, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let backoff = Duration::from_secs(BACKOFF_BASE_SECS << (attempt - 1));
                tracing::warn!(
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "upstream call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Entry point for a spawned generation job. Drives the job from
/// `processing` to a terminal state; never panics the process.
pub async fn run_generation_job(state: AppState, job_id: Uuid, campaign: CampaignRequest) {
    let started = std::time::Instant::now();

    let Some(mut job) = state.store.get(job_id).await else {
        tracing::error!(%job_id, "job missing from store at worker start");
        return;
    };
    job.start_processing();
    job.set_progress(Progress::new("Initializing", 0));
    state.store.put(job.clone()).await;

    match run_pipeline(&state, &mut job, campaign).await {
        Ok(result) => {
            metrics::counter!("generation_jobs_completed").increment(1);
            metrics::histogram!("generation_job_seconds").record(started.elapsed().as_secs_f64());
            tracing::info!(%job_id, images = result.images.len(), "generation job completed");
            job.complete(result);
            state.store.put(job).await;
        }
        Err(error) => {
            metrics::counter!("generation_jobs_failed").increment(1);
            tracing::error!(%job_id, kind = %error.kind, message = %error.message, "generation job failed");
            job.fail(error);
            state.store.put(job).await;
        }
    }
}

async fn run_pipeline(
    state: &AppState,
    job: &mut Job,
    mut campaign: CampaignRequest,
) -> Result<GenerationResult, JobError> {
    // Screening runs before any upstream call.
    screen_campaign(&state.screen, &campaign)?;

    let mut brand_name = campaign.brand_name.clone().unwrap_or_default();
    if brand_name.is_empty() {
        update_progress(state, job, "Generating brand name", 10).await;
        brand_name = with_retries(state.max_attempts, || {
            state.llm.generate_brand_name(
                &campaign.products,
                &campaign.target_market,
                &campaign.target_audience,
            )
        })
        .await
        .map_err(|e| JobError::new(e.failure_kind(), e.to_string()))?;
        tracing::info!(brand = %brand_name, "generated brand name");
        campaign.brand_name = Some(brand_name.clone());
    }

    let mut campaign_message = campaign.campaign_message.clone().unwrap_or_default();
    if campaign_message.is_empty() {
        update_progress(state, job, "Generating campaign message", 20).await;
        campaign_message = with_retries(state.max_attempts, || {
            state.llm.generate_campaign_message(
                &campaign.products,
                &campaign.target_market,
                &campaign.target_audience,
                &brand_name,
            )
        })
        .await
        .map_err(|e| JobError::new(e.failure_kind(), e.to_string()))?;
        tracing::info!(message = %campaign_message, "generated campaign message");
        campaign.campaign_message = Some(campaign_message.clone());
    }

    update_progress(state, job, "Loading assets", 30).await;
    let assets = state.assets.load_all();
    let assets_context = AssetsLoader::format_for_prompt(&assets);

    update_progress(state, job, "Optimizing prompt", 40).await;
    let (prompt, translated_campaign_message) = with_retries(state.max_attempts, || {
        state.llm.optimize_prompt(
            &campaign.products,
            &campaign.target_market,
            &campaign.target_audience,
            &brand_name,
            &campaign_message,
            &assets_context,
        )
    })
    .await
    .map_err(|e| JobError::new(e.failure_kind(), e.to_string()))?;
    tracing::info!(
        prompt_chars = prompt.len(),
        translated = translated_campaign_message.as_deref().unwrap_or("(none)"),
        "prompt optimized"
    );

    let output_dir = run_dir_name(&brand_name, &campaign.products);
    let base_output_dir = state.outputs_dir.join(&output_dir);
    std::fs::create_dir_all(&base_output_dir)
        .map_err(|e| JobError::new(FailureKind::Internal, e.to_string()))?;

    let mut images = Vec::new();
    let mut generation_errors: Vec<JobError> = Vec::new();
    let total = AspectRatio::ALL.len();

    for (idx, ratio) in AspectRatio::ALL.into_iter().enumerate() {
        let percent = 50 + (((idx + 1) * 40) / total) as u8;
        update_progress(state, job, &format!("Generating {ratio} banner"), percent).await;

        match generate_one(
            state,
            &prompt,
            ratio,
            &base_output_dir,
            &output_dir,
            &campaign.target_market,
        )
        .await
        {
            Ok(artifact) => {
                metrics::counter!("generation_images_total").increment(1);
                images.push(artifact);
            }
            Err(error) => {
                tracing::error!(%ratio, kind = %error.kind, message = %error.message, "banner generation failed");
                // The same prompt cannot succeed for the remaining ratios.
                let fatal = error.kind.needs_brief_revision()
                    || error.kind == FailureKind::AuthRejected;
                generation_errors.push(error);
                if fatal {
                    break;
                }
            }
        }
    }

    if images.is_empty() {
        return Err(generation_errors.into_iter().next().unwrap_or_else(|| {
            JobError::new(FailureKind::Upstream, "All image generations failed")
        }));
    }
    if !generation_errors.is_empty() {
        tracing::warn!(
            failed = generation_errors.len(),
            generated = images.len(),
            "job completed with partial failures"
        );
    }

    Ok(GenerationResult {
        brand_name,
        campaign_message,
        translated_campaign_message,
        images,
        output_dir,
    })
}

/// Generate, decode, and persist a single banner.
pub async fn generate_one(
    state: &AppState,
    prompt: &str,
    ratio: AspectRatio,
    base_output_dir: &Path,
    run_dir: &str,
    target_market: &str,
) -> Result<ImageArtifact, JobError> {
    let bytes = with_retries(state.max_attempts, || state.generator.generate(prompt, ratio))
        .await
        .map_err(|e| JobError::new(e.failure_kind(), e.to_string()))?;
    save_artifact(&bytes, ratio, base_output_dir, run_dir, target_market)
}

/// Decode the generated bytes and save them as a PNG under the per-ratio
/// directory, returning the artifact record.
pub fn save_artifact(
    bytes: &[u8],
    ratio: AspectRatio,
    base_output_dir: &Path,
    run_dir: &str,
    target_market: &str,
) -> Result<ImageArtifact, JobError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| JobError::new(FailureKind::Internal, format!("could not decode image: {e}")))?;
    let (width, height) = decoded.dimensions();

    let aspect_dir = base_output_dir.join(ratio.dir_name());
    std::fs::create_dir_all(&aspect_dir)
        .map_err(|e| JobError::new(FailureKind::Internal, e.to_string()))?;

    let filename = format!("banner_{}.png", slugify(target_market));
    let output_path = aspect_dir.join(&filename);
    decoded
        .save_with_format(&output_path, image::ImageFormat::Png)
        .map_err(|e| JobError::new(FailureKind::Internal, format!("could not save image: {e}")))?;

    let relative = format!("{run_dir}/{}/{filename}", ratio.dir_name());
    tracing::debug!(path = %relative, width, height, "saved banner");
    Ok(ImageArtifact {
        aspect_ratio: ratio,
        url: format!("/outputs/{relative}"),
        path: relative,
        size: Some([width, height]),
    })
}

/// Reject campaigns whose free-text fields contain prohibited terms.
pub fn screen_campaign(screen: &TermScreen, campaign: &CampaignRequest) -> Result<(), JobError> {
    let found = screen.scan_fields(campaign.free_text_fields());
    if !found.is_empty() {
        return Err(JobError::new(
            FailureKind::ProhibitedContent,
            format!(
                "Campaign rejected: prohibited terms found: {}. Please revise the campaign brief.",
                found.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Directory name for one generation run: brand slug (or first product) plus
/// timestamp, e.g. `trailcraft_20250101_120000`.
pub fn run_dir_name(brand_name: &str, products: &[String]) -> String {
    let base = if brand_name.trim().is_empty() {
        products.first().map(String::as_str).unwrap_or("campaign")
    } else {
        brand_name
    };
    let mut slug = slugify(base);
    slug.truncate(30);
    format!("{slug}_{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

fn slugify(text: &str) -> String {
    text.to_lowercase().replace([' ', '/'], "_")
}

async fn update_progress(state: &AppState, job: &mut Job, step: &str, percent: u8) {
    job.set_progress(Progress::new(step, percent));
    state.store.put(job.clone()).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dir_prefers_brand_over_products() {
        let products = vec!["running shoes".to_string(), "energy drink".to_string()];
        let named = run_dir_name("Trail Craft", &products);
        assert!(named.starts_with("trail_craft_"));

        let fallback = run_dir_name("  ", &products);
        assert!(fallback.starts_with("running_shoes_"));
    }

    #[test]
    fn screening_rejects_prohibited_campaigns() {
        let screen = TermScreen::with_defaults();
        let campaign = CampaignRequest {
            products: vec!["running shoes".into(), "miracle cure gel".into()],
            target_market: "US".into(),
            target_audience: "athletes".into(),
            brand_name: None,
            campaign_message: None,
        };
        let error = screen_campaign(&screen, &campaign).unwrap_err();
        assert_eq!(error.kind, FailureKind::ProhibitedContent);
        assert!(error.message.contains("miracle cure"));
    }

    #[test]
    fn save_artifact_writes_png_and_records_size() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();

        let artifact = save_artifact(
            &buf.into_inner(),
            AspectRatio::Landscape,
            dir.path(),
            "trailcraft_20250101_120000",
            "New Zealand",
        )
        .unwrap();

        assert_eq!(artifact.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(artifact.size, Some([8, 4]));
        assert_eq!(
            artifact.path,
            "trailcraft_20250101_120000/16_9/banner_new_zealand.png"
        );
        assert!(artifact.url.starts_with("/outputs/"));
        assert!(dir.path().join("16_9/banner_new_zealand.png").exists());
    }

    #[test]
    fn undecodable_bytes_fail_with_internal_kind() {
        let dir = tempfile::tempdir().unwrap();
        let error = save_artifact(b"not an image", AspectRatio::Square, dir.path(), "x", "US")
            .unwrap_err();
        assert_eq!(error.kind, FailureKind::Internal);
    }
}
