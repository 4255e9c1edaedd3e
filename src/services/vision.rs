//! Vision-model client for brand compliance checking.
//!
//! Images are sent inline as base64 data URLs. The model is asked for a JSON
//! verdict; mapping is tolerant of partial or malformed responses and
//! degrades to an `unknown` verdict rather than failing.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::models::compliance::ComplianceVerdict;

const DEFAULT_MODEL: &str = "openai/gpt-4.1-nano";

/// Client for the vision-capable compliance model.
pub struct VisionClient {
    http: Client,
    api_token: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl VisionClient {
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

    /// Check whether the given images visibly carry the brand.
    pub async fn check_compliance(
        &self,
        images: &[Vec<u8>],
        brand_name: &str,
        campaign_message: Option<&str>,
    ) -> Result<ComplianceVerdict, VisionError> {
        let system_prompt = "You are an expert brand compliance checker for advertising \
            banners. Detect ALL text visible in the image (all languages and scripts), \
            check whether the brand name appears in the detected text, and identify \
            whether a brand logo is visible. An image is compliant if the brand name is \
            present in the text; a logo is optional and does not affect compliance.";

        let mut prompt = format!(
            "Brand Name to Check: \"{brand_name}\"\n\n\
             Analyze the provided image(s): list all visible text, check whether \
             \"{brand_name}\" appears (exact match or close variations), and identify any \
             logo.\n\n\
             Return your analysis as a JSON object with these fields:\n\
             detected_text (array of strings), brand_name_found (bool), \
             brand_name_matches (array of strings), logo_visible (bool), \
             logo_description (string or \"none\"), \
             compliance_status (\"compliant\" or \"non-compliant\"), \
             compliance_notes (string)."
        );
        if let Some(message) = campaign_message {
            prompt.push_str(&format!(
                "\n\nAdditionally, check if the campaign message \"{message}\" appears in \
                 the detected text."
            ));
        }

        let image_input: Vec<String> = images.iter().map(|bytes| to_data_url(bytes)).collect();

        let url = format!("{}/v1/models/{}/predictions", self.base_url, self.model);
        let body = serde_json::json!({
            "input": {
                "prompt": prompt,
                "system_prompt": system_prompt,
                "image_input": image_input,
                "temperature": 0.3,
                "max_completion_tokens": 2048,
                "top_p": 1,
                "response_format": {"type": "json_object"},
            }
        });

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
            return Err(VisionError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let prediction: PredictionResponse = response.json().await?;
        if let Some(error) = prediction.error {
            return Err(VisionError::Api {
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
            _ => String::new(),
        };

        Ok(verdict_from_response(&text))
    }
}

/// Extract the JSON object from the model text and map it to a verdict.
/// Unparseable responses degrade to an `unknown` verdict.
fn verdict_from_response(text: &str) -> ComplianceVerdict {
    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => return ComplianceVerdict::parse_failure("no JSON object in response"),
    };
    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(value) => ComplianceVerdict::from_model_json(&value),
        Err(e) => ComplianceVerdict::parse_failure(&e.to_string()),
    }
}

/// Inline an image as a data URL, guessing the media type from the bytes.
fn to_data_url(bytes: &[u8]) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "image/png",
    };
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vision model API error ({status}): {message}")]
    Api { status: u16, message: String },
}
