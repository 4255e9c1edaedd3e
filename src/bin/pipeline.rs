//! One-shot pipeline runner: load a campaign brief from JSON, generate
//! banners for every aspect ratio, and write a step-by-step execution report
//! next to the artifacts.
//!
//! Usage: `pipeline [path/to/campaign.json]` (defaults to
//! `demos/campaign.json`).

use adcraft::{
    app_state::AppState,
    config::AppConfig,
    models::campaign::CampaignRequest,
    models::job::AspectRatio,
    services::assets::AssetsLoader,
    services::reporter::{PipelineReporter, StepStatus},
    services::worker,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let brief_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/campaign.json".to_string());

    tracing::info!(brief = %brief_path, "loading campaign brief");
    let raw = match std::fs::read_to_string(&brief_path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(error = %e, "could not read campaign brief");
            std::process::exit(1);
        }
    };
    let campaign: CampaignRequest = match serde_json::from_str(&raw) {
        Ok(campaign) => campaign,
        Err(e) => {
            tracing::error!(error = %e, "could not parse campaign brief");
            std::process::exit(1);
        }
    };

    let config = AppConfig::from_env().expect("Failed to load configuration");
    std::fs::create_dir_all(&config.outputs_dir).expect("Failed to create outputs directory");
    let state = AppState::from_config(&config).expect("Failed to initialize services");

    let exit_code = run(&state, campaign).await;
    std::process::exit(exit_code);
}

async fn run(state: &AppState, campaign: CampaignRequest) -> i32 {
    let mut reporter = PipelineReporter::new(&campaign, &state.outputs_dir);

    // Validation and prohibited-term screening
    reporter.start_step("Campaign Validation");
    if let Err(errors) = campaign.validated() {
        let detail = errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        reporter.end_step(StepStatus::Failed, Some(&detail));
        reporter.finalize("failed");
        return 1;
    }
    let mut campaign = campaign.normalized();
    if let Err(error) = worker::screen_campaign(&state.screen, &campaign) {
        reporter.end_step(StepStatus::Failed, Some(&error.message));
        reporter.finalize("failed");
        return 1;
    }
    reporter.end_step(StepStatus::Success, None);

    // Brand name (generated when the brief leaves it blank)
    reporter.start_step("Resolve Brand Name");
    let brand_name = match campaign.brand_name.clone() {
        Some(brand) => {
            reporter.end_step(StepStatus::Skipped, None);
            brand
        }
        None => {
            let generated = worker::with_retries(state.max_attempts, || {
                state.llm.generate_brand_name(
                    &campaign.products,
                    &campaign.target_market,
                    &campaign.target_audience,
                )
            })
            .await;
            match generated {
                Ok(brand) => {
                    reporter.step_detail("brand_name", brand.clone());
                    reporter.end_step(StepStatus::Success, None);
                    campaign.brand_name = Some(brand.clone());
                    brand
                }
                Err(e) => {
                    reporter.end_step(StepStatus::Failed, Some(&e.to_string()));
                    reporter.finalize("failed");
                    return 1;
                }
            }
        }
    };

    // Campaign message
    reporter.start_step("Resolve Campaign Message");
    let campaign_message = match campaign.campaign_message.clone() {
        Some(message) => {
            reporter.end_step(StepStatus::Skipped, None);
            message
        }
        None => {
            let generated = worker::with_retries(state.max_attempts, || {
                state.llm.generate_campaign_message(
                    &campaign.products,
                    &campaign.target_market,
                    &campaign.target_audience,
                    &brand_name,
                )
            })
            .await;
            match generated {
                Ok(message) => {
                    reporter.step_detail("campaign_message", message.clone());
                    reporter.end_step(StepStatus::Success, None);
                    campaign.campaign_message = Some(message.clone());
                    message
                }
                Err(e) => {
                    reporter.end_step(StepStatus::Failed, Some(&e.to_string()));
                    reporter.finalize("failed");
                    return 1;
                }
            }
        }
    };

    // Text assets enrich the prompt when present
    reporter.start_step("Load Assets");
    let assets = state.assets.load_all();
    reporter.step_detail("text_assets_count", assets.len());
    let assets_context = AssetsLoader::format_for_prompt(&assets);
    reporter.end_step(StepStatus::Success, None);

    reporter.start_step("Generate Optimized Prompt");
    let optimized = worker::with_retries(state.max_attempts, || {
        state.llm.optimize_prompt(
            &campaign.products,
            &campaign.target_market,
            &campaign.target_audience,
            &brand_name,
            &campaign_message,
            &assets_context,
        )
    })
    .await;
    let (prompt, translated_message) = match optimized {
        Ok(result) => result,
        Err(e) => {
            reporter.end_step(StepStatus::Failed, Some(&e.to_string()));
            reporter.finalize("failed");
            return 1;
        }
    };
    reporter.step_detail("prompt_length", prompt.len());
    if let Some(translated) = &translated_message {
        reporter.step_detail("translated_message", translated.clone());
    }
    reporter.end_step(StepStatus::Success, None);
    tracing::info!(prompt = %prompt, "optimized prompt");

    // One image per aspect ratio; individual failures do not stop the run
    let run_dir = worker::run_dir_name(&brand_name, &campaign.products);
    let base_output_dir = state.outputs_dir.join(&run_dir);
    if let Err(e) = std::fs::create_dir_all(&base_output_dir) {
        tracing::error!(error = %e, "could not create output directory");
        reporter.finalize("failed");
        return 1;
    }

    let mut generated = 0usize;
    for ratio in AspectRatio::ALL {
        reporter.start_step(&format!("Generate {ratio} Image"));
        reporter.step_detail("aspect_ratio", ratio.to_string());

        match worker::generate_one(
            state,
            &prompt,
            ratio,
            &base_output_dir,
            &run_dir,
            &campaign.target_market,
        )
        .await
        {
            Ok(artifact) => {
                if let Some([width, height]) = artifact.size {
                    reporter.step_detail("image_size", format!("{width}x{height}"));
                }
                reporter.add_output_file(&artifact.path);
                reporter.end_step(StepStatus::Success, None);
                generated += 1;
            }
            Err(error) => {
                reporter.end_step(StepStatus::Failed, Some(&error.message));
                if error.kind.needs_brief_revision() {
                    tracing::error!(
                        "content was rejected by the generation model; revise the campaign \
                         brief and try again"
                    );
                    break;
                }
            }
        }
    }

    if generated == 0 {
        reporter.finalize("failed");
        return 1;
    }
    reporter.finalize("completed");
    0
}
