use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::{
    assets::AssetsLoader,
    image_gen::ImageGenClient,
    prompt::LlmClient,
    screening::TermScreen,
    vision::VisionClient,
};
use crate::store::{InMemoryJobStore, JobStore};

/// Shared application state passed to all route handlers and workers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub llm: Arc<LlmClient>,
    pub generator: Arc<ImageGenClient>,
    pub vision: Arc<VisionClient>,
    pub assets: Arc<AssetsLoader>,
    pub screen: Arc<TermScreen>,
    pub outputs_dir: PathBuf,
    pub max_attempts: u32,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn JobStore>,
        llm: LlmClient,
        generator: ImageGenClient,
        vision: VisionClient,
        assets: AssetsLoader,
        screen: TermScreen,
        outputs_dir: PathBuf,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            llm: Arc::new(llm),
            generator: Arc::new(generator),
            vision: Arc::new(vision),
            assets: Arc::new(assets),
            screen: Arc::new(screen),
            outputs_dir,
            max_attempts,
        }
    }

    /// Build the full service graph from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let timeout = Duration::from_secs(config.upstream_timeout_secs);

        let screen = match &config.prohibited_terms_path {
            Some(path) => {
                let screen = TermScreen::from_file(path)?;
                tracing::info!(terms = screen.len(), path = %path.display(), "loaded prohibited-term list");
                screen
            }
            None => TermScreen::with_defaults(),
        };

        let llm = LlmClient::new(&config.llm_api_base, &config.openai_api_token, timeout)?;
        let generator = ImageGenClient::new(
            &config.atlas_api_base,
            &config.atlascloud_api_key,
            timeout,
            Duration::from_secs(config.generation_poll_interval_secs),
            Duration::from_secs(config.generation_max_wait_secs),
        )?;
        let vision = VisionClient::new(&config.llm_api_base, &config.openai_api_token, timeout)?;

        Ok(Self::new(
            Arc::new(InMemoryJobStore::new()),
            llm,
            generator,
            vision,
            AssetsLoader::new(config.assets_dir.clone()),
            screen,
            config.outputs_dir.clone(),
            config.upstream_max_attempts,
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to load prohibited-term list: {0}")]
    Terms(#[from] std::io::Error),
}
