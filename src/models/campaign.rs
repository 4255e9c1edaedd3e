use std::collections::BTreeMap;

use garde::Validate;
use serde::{Deserialize, Serialize};

use super::non_blank;

/// Field name -> human-readable message, surfaced field-by-field at the API
/// boundary.
pub type FieldErrors = BTreeMap<String, String>;

/// A campaign brief submitted for banner generation.
///
/// Validation runs independently at the API boundary even though the UI
/// enforces the same rules; the two are separate trust domains.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CampaignRequest {
    /// Products to feature together in the banner, at least 2.
    #[garde(custom(at_least_two_products))]
    pub products: Vec<String>,

    /// Target market (e.g. US, Germany, Japan); drives message translation.
    #[garde(custom(non_blank))]
    pub target_market: String,

    #[garde(custom(non_blank))]
    pub target_audience: String,

    /// Generated downstream when absent.
    #[garde(skip)]
    #[serde(default)]
    pub brand_name: Option<String>,

    /// Generated downstream when absent; translated for non-English markets.
    #[garde(skip)]
    #[serde(default)]
    pub campaign_message: Option<String>,
}

fn at_least_two_products(products: &Vec<String>, _ctx: &()) -> garde::Result {
    let non_empty = products.iter().filter(|p| !p.trim().is_empty()).count();
    if non_empty < 2 {
        return Err(garde::Error::new(format!(
            "campaign must have at least 2 products (found {non_empty})"
        )));
    }
    Ok(())
}

impl CampaignRequest {
    /// Validate the brief, returning a field -> message map on failure.
    pub fn validated(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(|report| {
            let mut errors = FieldErrors::new();
            for (path, error) in report.iter() {
                errors
                    .entry(path.to_string())
                    .or_insert_with(|| error.to_string());
            }
            errors
        })
    }

    /// Trim all free-text fields, drop empty products, and normalize blank
    /// optionals to absent. Call after [`Self::validated`].
    pub fn normalized(self) -> Self {
        let blank_to_none = |field: Option<String>| {
            field
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            products: self
                .products
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            target_market: self.target_market.trim().to_string(),
            target_audience: self.target_audience.trim().to_string(),
            brand_name: blank_to_none(self.brand_name),
            campaign_message: blank_to_none(self.campaign_message),
        }
    }

    /// All free-text fields, for prohibited-term screening.
    pub fn free_text_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.products.iter().map(String::as_str).collect();
        fields.push(&self.target_market);
        fields.push(&self.target_audience);
        if let Some(brand) = &self.brand_name {
            fields.push(brand);
        }
        if let Some(message) = &self.campaign_message {
            fields.push(message);
        }
        fields
    }
}
