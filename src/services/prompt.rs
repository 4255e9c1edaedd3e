//! Language-model client for brand naming, campaign copy, and prompt
//! optimization.
//!
//! Talks to a Replicate-style predictions API in blocking mode. The
//! optimized prompt comes back as structured JSON; parsing is tolerant and
//! falls back to the raw text when the model ignores the format.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::job::FailureKind;

const DEFAULT_MODEL: &str = "openai/gpt-4.1-nano";

/// Client for the hosted language model.
pub struct LlmClient {
    http: Client,
    api_token: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    system_prompt: &'a str,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Structured output of the prompt-optimization call.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizedPrompt {
    pub image_prompt: String,
    #[serde(default)]
    pub translated_campaign_message: Option<String>,
    #[serde(default)]
    pub brand_mentions: u32,
    #[serde(default)]
    pub includes_logo: bool,
    #[serde(default)]
    pub includes_campaign_message: bool,
}

impl LlmClient {
    pub fn new(
        base_url: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_token: api_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Generate a short brand name for the campaign.
    pub async fn generate_brand_name(
        &self,
        products: &[String],
        target_market: &str,
        target_audience: &str,
    ) -> Result<String, LlmError> {
        let system_prompt = "You are an expert brand strategist. Generate a compelling, \
            memorable brand name that fits the products and target market.";
        let prompt = format!(
            "Generate a brand name for the following products:\n\
             Products: {}\n\
             Target Market: {target_market}\n\
             Target Audience: {target_audience}\n\n\
             Generate a single, compelling brand name (2-3 words maximum) that is \
             memorable, fits the products, and works well in the {target_market} market.\n\
             Return ONLY the brand name, nothing else.",
            products.join(", "),
        );

        let raw = self.run(system_prompt, &prompt, 50, 0.8, false).await?;
        Ok(strip_quotes(&raw))
    }

    /// Generate an English campaign slogan; translation happens later during
    /// prompt optimization.
    pub async fn generate_campaign_message(
        &self,
        products: &[String],
        target_market: &str,
        target_audience: &str,
        brand_name: &str,
    ) -> Result<String, LlmError> {
        let system_prompt = "You are an expert copywriter specializing in advertising \
            slogans. Generate compelling, memorable campaign messages that resonate \
            with target audiences.";
        let prompt = format!(
            "Generate a compelling campaign message/slogan for the following:\n\
             Brand Name: {brand_name}\n\
             Products: {}\n\
             Target Market: {target_market}\n\
             Target Audience: {target_audience}\n\n\
             Generate a single campaign slogan (3-6 words) in English that is memorable, \
             highlights key benefits or emotional appeal, and works for advertising \
             banners. Do NOT include the brand name \"{brand_name}\" in the slogan.\n\
             Return ONLY the campaign message, nothing else.",
            products.join(", "),
        );

        let raw = self.run(system_prompt, &prompt, 50, 0.8, false).await?;
        Ok(strip_quotes(&raw))
    }

    /// Transform a campaign brief into an optimized image-generation prompt,
    /// localizing the campaign message for the target market.
    ///
    /// Returns the prompt and the translated campaign message. When the model
    /// response is not parseable JSON, the raw text is used as the prompt and
    /// the message is left untranslated.
    pub async fn optimize_prompt(
        &self,
        products: &[String],
        target_market: &str,
        target_audience: &str,
        brand_name: &str,
        campaign_message: &str,
        assets_context: &str,
    ) -> Result<(String, Option<String>), LlmError> {
        let system_prompt = "You are an expert creative strategist optimizing prompts for \
            an image generation model, with global market expertise.\n\
            Best practices: use coherent natural language (subject + action + environment); \
            put ALL text that should appear in the image in double quotes; include specific \
            style descriptors (color, lighting, composition); state the application scenario \
            (advertising banner).\n\
            Localization: translate the campaign message to the target market's primary \
            language, EXCEPT for US, UK, Australia, and Canada where the English original \
            is used as-is. Keep brand names in English unless culturally inappropriate. \
            Adapt visual style, colors, and composition to the market's cultural preferences.\n\
            Respond with a JSON object with exactly these fields:\n\
            image_prompt (the complete visual description), \
            translated_campaign_message (the message as it appears in the image), \
            brand_mentions (count of quoted brand name occurrences), \
            includes_logo (bool), includes_campaign_message (bool).";

        let assets_section = if assets_context.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nADDITIONAL CREATIVE GUIDANCE:\n{assets_context}\n\
                 These guidelines should inform the visual style and mood of the banner."
            )
        };

        let prompt = format!(
            "Campaign Brief:\n\
             Products: {products_list}\n\
             Target Market: {target_market}\n\
             Target Audience: {target_audience}\n\
             Campaign Message (ORIGINAL ENGLISH): \"{campaign_message}\"\n\
             Brand Name: \"{brand_name}\"{assets_section}\n\n\
             Create a detailed optimized prompt for a professional advertising banner for \
             the {target_market} market that showcases ALL products together.\n\
             Requirements:\n\
             1. The brand name \"{brand_name}\" MUST appear in double quotes in the prompt.\n\
             2. The campaign message MUST appear in double quotes, translated to the \
             {target_market} primary language (English markets keep it as-is).\n\
             3. Show all products in the scene: {products_list}.\n\
             4. Describe brand logo placement clearly (e.g. top-right corner).\n\
             5. Be specific about lighting, colors, composition, and atmosphere for the \
             {target_market} aesthetic and the {target_audience} audience.",
            products_list = products.join(", "),
        );

        let raw = self.run(system_prompt, &prompt, 600, 0.7, true).await?;

        match parse_structured(&raw) {
            Some(optimized) => {
                tracing::info!(
                    brand_mentions = optimized.brand_mentions,
                    includes_logo = optimized.includes_logo,
                    includes_campaign_message = optimized.includes_campaign_message,
                    "prompt optimization returned structured output"
                );
                Ok((optimized.image_prompt, optimized.translated_campaign_message))
            }
            None => {
                tracing::warn!("could not parse structured prompt output, using raw response");
                Ok((raw, None))
            }
        }
    }

    /// Run a blocking prediction and return the concatenated text output.
    async fn run(
        &self,
        system_prompt: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        json_object: bool,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/models/{}/predictions", self.base_url, self.model);
        let body = PredictionRequest {
            input: PredictionInput {
                prompt,
                system_prompt,
                temperature,
                max_completion_tokens: max_tokens,
                top_p: 1,
                response_format: json_object.then_some(ResponseFormat {
                    format_type: "json_object",
                }),
            },
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let prediction: PredictionResponse = response.json().await?;
        if let Some(error) = prediction.error {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error,
            });
        }

        let text = match prediction.output {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(chunks)) => chunks
                .iter()
                .filter_map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(""),
            _ => return Err(LlmError::EmptyOutput),
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyOutput);
        }
        Ok(text)
    }
}

/// Extract the JSON object embedded in a model response.
fn parse_structured(raw: &str) -> Option<OptimizedPrompt> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn strip_quotes(raw: &str) -> String {
    raw.trim().trim_matches(['"', '\'']).trim().to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Language model returned no output")]
    EmptyOutput,
}

impl LlmError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Self::Http(_) => FailureKind::Upstream,
            Self::Api { status: 401, .. } | Self::Api { status: 403, .. } => {
                FailureKind::AuthRejected
            }
            Self::Api { status: 429, .. } => FailureKind::RateLimited,
            Self::Api { .. } | Self::EmptyOutput => FailureKind::Upstream,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.failure_kind(),
            FailureKind::RateLimited | FailureKind::Timeout | FailureKind::Upstream
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_output_with_surrounding_noise() {
        let raw = "Here you go:\n{\"image_prompt\": \"a banner\", \
                   \"translated_campaign_message\": \"Laufe Weiter\", \
                   \"brand_mentions\": 2, \"includes_logo\": true, \
                   \"includes_campaign_message\": true}\nDone.";
        let parsed = parse_structured(raw).unwrap();
        assert_eq!(parsed.image_prompt, "a banner");
        assert_eq!(
            parsed.translated_campaign_message.as_deref(),
            Some("Laufe Weiter")
        );
        assert_eq!(parsed.brand_mentions, 2);
    }

    #[test]
    fn unparseable_output_returns_none() {
        assert!(parse_structured("plain text with no json").is_none());
        assert!(parse_structured("} backwards {").is_none());
    }

    #[test]
    fn strips_wrapping_quotes_from_generated_names() {
        assert_eq!(strip_quotes("\"TrailCraft\"\n"), "TrailCraft");
        assert_eq!(strip_quotes("'Run Further'"), "Run Further");
        assert_eq!(strip_quotes("  PeakFuel  "), "PeakFuel");
    }

    #[test]
    fn api_errors_classify_to_failure_kinds() {
        let auth = LlmError::Api {
            status: 401,
            message: "bad token".into(),
        };
        assert_eq!(auth.failure_kind(), FailureKind::AuthRejected);
        assert!(!auth.is_retryable());

        let rate = LlmError::Api {
            status: 429,
            message: "slow down".into(),
        };
        assert_eq!(rate.failure_kind(), FailureKind::RateLimited);
        assert!(rate.is_retryable());
    }
}
