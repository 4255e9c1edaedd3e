use garde::Validate;
use serde::{Deserialize, Serialize};

use super::non_blank;

/// Request to check generated images for brand presence.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComplianceCheckRequest {
    /// Paths relative to the outputs mount.
    #[garde(length(min = 1))]
    pub image_paths: Vec<String>,

    #[garde(custom(non_blank))]
    pub brand_name: String,

    #[garde(skip)]
    #[serde(default)]
    pub campaign_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    /// The model response could not be interpreted.
    Unknown,
}

/// Structured verdict of a vision-model compliance check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceVerdict {
    pub compliance_status: ComplianceStatus,
    pub brand_name_found: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brand_name_matches: Vec<String>,
    pub logo_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_description: Option<String>,
    #[serde(default)]
    pub detected_text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_notes: Option<String>,
}

impl ComplianceVerdict {
    /// Map a raw model response into a verdict, tolerating partial or
    /// missing fields. Never fails: unrecognized shapes degrade to defaults.
    pub fn from_model_json(value: &serde_json::Value) -> Self {
        let str_list = |v: Option<&serde_json::Value>| -> Vec<String> {
            v.and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        };
        let opt_str = |v: Option<&serde_json::Value>| -> Option<String> {
            v.and_then(|v| v.as_str())
                .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
                .map(str::to_string)
        };

        let status = match value.get("compliance_status").and_then(|v| v.as_str()) {
            Some("compliant") => ComplianceStatus::Compliant,
            Some("non-compliant") | Some("non_compliant") => ComplianceStatus::NonCompliant,
            _ => ComplianceStatus::Unknown,
        };

        Self {
            compliance_status: status,
            brand_name_found: value
                .get("brand_name_found")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            brand_name_matches: str_list(value.get("brand_name_matches")),
            logo_visible: value
                .get("logo_visible")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            logo_description: opt_str(value.get("logo_description")),
            detected_text: str_list(value.get("detected_text")),
            compliance_notes: opt_str(value.get("compliance_notes")),
        }
    }

    /// Fallback verdict when the model response cannot be parsed at all.
    pub fn parse_failure(reason: &str) -> Self {
        Self {
            compliance_status: ComplianceStatus::Unknown,
            brand_name_found: false,
            brand_name_matches: Vec::new(),
            logo_visible: false,
            logo_description: None,
            detected_text: Vec::new(),
            compliance_notes: Some(format!("Failed to parse model response: {reason}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_complete_response() {
        let raw = json!({
            "detected_text": ["TrailCraft", "Run Further"],
            "brand_name_found": true,
            "brand_name_matches": ["TrailCraft"],
            "logo_visible": true,
            "logo_description": "mountain emblem, top-right",
            "compliance_status": "compliant",
            "compliance_notes": "Brand name clearly visible"
        });
        let verdict = ComplianceVerdict::from_model_json(&raw);
        assert_eq!(verdict.compliance_status, ComplianceStatus::Compliant);
        assert!(verdict.brand_name_found);
        assert!(verdict.logo_visible);
        assert_eq!(verdict.detected_text.len(), 2);
    }

    #[test]
    fn tolerates_partial_response() {
        let raw = json!({ "compliance_status": "non-compliant" });
        let verdict = ComplianceVerdict::from_model_json(&raw);
        assert_eq!(verdict.compliance_status, ComplianceStatus::NonCompliant);
        assert!(!verdict.brand_name_found);
        assert!(verdict.detected_text.is_empty());
        assert!(verdict.logo_description.is_none());
    }

    #[test]
    fn unknown_status_and_literal_none_logo() {
        let raw = json!({
            "compliance_status": "maybe",
            "logo_description": "none"
        });
        let verdict = ComplianceVerdict::from_model_json(&raw);
        assert_eq!(verdict.compliance_status, ComplianceStatus::Unknown);
        assert!(verdict.logo_description.is_none());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let verdict = ComplianceVerdict::parse_failure("truncated");
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["compliance_status"], "unknown");
        let nc = serde_json::to_value(ComplianceStatus::NonCompliant).unwrap();
        assert_eq!(nc, "non-compliant");
    }
}
