use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// API token for the upstream image-generation service. Never exposed
    /// to clients.
    pub atlascloud_api_key: String,

    /// API token for the language and vision models (prompt optimization,
    /// copy generation, compliance checking).
    pub openai_api_token: String,

    /// Base URL of the image-generation API.
    #[serde(default = "default_atlas_api_base")]
    pub atlas_api_base: String,

    /// Base URL of the language/vision model API.
    #[serde(default = "default_llm_api_base")]
    pub llm_api_base: String,

    /// Directory generated banners are written to and served from.
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,

    /// Directory of optional text assets (style guides, brainstorms) used to
    /// enrich prompts.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Optional prohibited-term list, one term per line. Falls back to the
    /// embedded default set.
    #[serde(default)]
    pub prohibited_terms_path: Option<PathBuf>,

    /// Per-request timeout for upstream HTTP calls, in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Interval between generation status polls, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub generation_poll_interval_secs: u64,

    /// Total wall-clock budget for a single image generation, in seconds.
    #[serde(default = "default_max_wait_secs")]
    pub generation_max_wait_secs: u64,

    /// Attempts per upstream call before giving up on transient failures.
    #[serde(default = "default_max_attempts")]
    pub upstream_max_attempts: u32,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_atlas_api_base() -> String {
    "https://api.atlascloud.ai".to_string()
}

fn default_llm_api_base() -> String {
    "https://api.replicate.com".to_string()
}

fn default_outputs_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_wait_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
