//! Client for the hosted image-generation service.
//!
//! Submit -> poll -> download flow: generation starts a prediction, the
//! client polls within a bounded wall-clock budget, then fetches the image
//! bytes. Upstream failures are classified into [`FailureKind`] here, at the
//! boundary, so nothing downstream inspects message text.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::{sleep, Instant};

use crate::models::job::{AspectRatio, FailureKind};

const MODEL_ID: &str = "bytedance/seedream-v4";

/// Client for the image-generation API.
pub struct ImageGenClient {
    http: Client,
    api_token: String,
    base_url: String,
    poll_interval: Duration,
    max_wait: Duration,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, http_status: StatusCode) -> Result<T, ImageGenError> {
        if self.error.is_some() || self.code != Some(200) {
            let message = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(classify(Some(http_status), &message));
        }
        self.data
            .ok_or_else(|| classify(Some(http_status), "missing data in response"))
    }
}

#[derive(Deserialize, Default)]
struct GenerateData {
    id: String,
}

#[derive(Deserialize, Default)]
struct PredictionData {
    status: String,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ImageGenClient {
    pub fn new(
        base_url: &str,
        api_token: &str,
        timeout: Duration,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_token: api_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
            max_wait,
        })
    }

    /// Generate one image and return its raw bytes.
    pub async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<u8>, ImageGenError> {
        let prediction_id = self.submit(prompt, aspect_ratio).await?;
        tracing::debug!(%prediction_id, %aspect_ratio, "image generation started");
        let image_url = self.poll_until_done(&prediction_id).await?;
        self.download(&image_url).await
    }

    async fn submit(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<String, ImageGenError> {
        let url = format!("{}/api/v1/model/generateImage", self.base_url);
        let body = serde_json::json!({
            "model": MODEL_ID,
            "enable_base64_output": false,
            "enable_sync_mode": false,
            "prompt": prompt,
            "size": aspect_ratio.size_param(),
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let envelope: Envelope<GenerateData> = response.json().await?;
        Ok(envelope.into_data(status)?.id)
    }

    /// Poll the prediction until terminal, bounded by the configured
    /// wall-clock budget. Transient poll request failures are tolerated
    /// inside the budget.
    async fn poll_until_done(&self, prediction_id: &str) -> Result<String, ImageGenError> {
        let url = format!("{}/api/v1/model/prediction/{prediction_id}", self.base_url);
        let started = Instant::now();

        loop {
            if started.elapsed() > self.max_wait {
                return Err(ImageGenError::TimedOut {
                    waited_secs: self.max_wait.as_secs(),
                });
            }

            let poll = async {
                let response = self
                    .http
                    .get(&url)
                    .bearer_auth(&self.api_token)
                    .send()
                    .await?;
                let status = response.status();
                let envelope: Envelope<PredictionData> = response.json().await?;
                envelope.into_data(status)
            };

            match poll.await {
                Ok(data) => match data.status.as_str() {
                    "completed" => {
                        let image_url = data
                            .outputs
                            .into_iter()
                            .next()
                            .ok_or(ImageGenError::NoOutput)?;
                        tracing::debug!(
                            elapsed_secs = started.elapsed().as_secs(),
                            "image generation completed"
                        );
                        return Ok(image_url);
                    }
                    "failed" => {
                        let message =
                            data.error.unwrap_or_else(|| "Generation failed".to_string());
                        return Err(classify(None, &message));
                    }
                    _ => sleep(self.poll_interval).await,
                },
                Err(e @ ImageGenError::Http(_)) => {
                    tracing::warn!(error = %e, "poll request failed, retrying");
                    sleep(self.poll_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download(&self, image_url: &str) -> Result<Vec<u8>, ImageGenError> {
        let response = self.http.get(image_url).send().await?;
        if !response.status().is_success() {
            return Err(classify(
                Some(response.status()),
                "failed to download generated image",
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Classify an upstream failure into a structured error.
fn classify(status: Option<StatusCode>, message: &str) -> ImageGenError {
    let lowered = message.to_lowercase();

    if lowered.contains("sensitive") || lowered.contains("nsfw") || lowered.contains("flagged") {
        return ImageGenError::Sensitive {
            message: message.to_string(),
        };
    }
    if status == Some(StatusCode::TOO_MANY_REQUESTS) || lowered.contains("rate limit") {
        return ImageGenError::RateLimited;
    }
    if status == Some(StatusCode::UNAUTHORIZED)
        || status == Some(StatusCode::FORBIDDEN)
        || lowered.contains("unauthorized")
        || lowered.contains("invalid token")
    {
        return ImageGenError::AuthRejected;
    }
    ImageGenError::Api {
        message: message.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content flagged as sensitive. Please review and modify the campaign brief. ({message})")]
    Sensitive { message: String },

    #[error("Image generation rate limited")]
    RateLimited,

    #[error("Image generation API rejected the configured token")]
    AuthRejected,

    #[error("Image generation timed out after {waited_secs} seconds")]
    TimedOut { waited_secs: u64 },

    #[error("Completed generation contained no outputs")]
    NoOutput,

    #[error("Image generation API error: {message}")]
    Api { message: String },
}

impl ImageGenError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Sensitive { .. } => FailureKind::SensitiveContent,
            Self::RateLimited => FailureKind::RateLimited,
            Self::AuthRejected => FailureKind::AuthRejected,
            Self::TimedOut { .. } => FailureKind::Timeout,
            Self::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Self::Http(_) | Self::NoOutput | Self::Api { .. } => FailureKind::Upstream,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.failure_kind(),
            FailureKind::RateLimited | FailureKind::Timeout | FailureKind::Upstream
        )
    }
}
