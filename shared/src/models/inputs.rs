//! User-supplied farm inputs
//!
//! One request shape serves every advisory task. Field aliases accept the
//! historical per-task spellings (`State`, `state_name`, `crop_name`, `N`, ...)
//! so existing clients keep working.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Farm context posted to any `/<task>/predict` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FarmInputs {
    #[serde(default, alias = "State", alias = "state_name")]
    #[validate(length(min = 1, message = "state must not be empty"))]
    pub state: Option<String>,

    #[serde(default, alias = "District", alias = "dist_name")]
    #[validate(length(min = 1, message = "district must not be empty"))]
    pub district: Option<String>,

    #[serde(default, alias = "Country")]
    #[validate(length(min = 1, message = "country must not be empty"))]
    pub country: Option<String>,

    #[serde(default, alias = "Crop", alias = "crop_name")]
    #[validate(length(min = 1, message = "crop must not be empty"))]
    pub crop: Option<String>,

    #[serde(default, alias = "Variety")]
    pub variety: Option<String>,

    #[serde(default, alias = "Growth_Stage")]
    pub growth_stage: Option<String>,

    /// Caller's own soil classification; wins over the resolved one
    #[serde(default, alias = "Soil_Type")]
    pub soil_type: Option<String>,

    #[serde(default, alias = "area_in_acres")]
    #[validate(range(min = 0.0, message = "area must not be negative"))]
    pub area_acres: Option<f64>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub water_availability: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub source_of_water: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub field_slope: Option<String>,

    #[serde(default, alias = "N")]
    #[validate(range(min = 0.0, message = "nitrogen must not be negative"))]
    pub nitrogen: Option<f64>,

    #[serde(default, alias = "P")]
    #[validate(range(min = 0.0, message = "phosphorus must not be negative"))]
    pub phosphorus: Option<f64>,

    #[serde(default, alias = "K")]
    #[validate(range(min = 0.0, message = "potassium must not be negative"))]
    pub potassium: Option<f64>,
}

impl FarmInputs {
    /// Trimmed, non-empty value of an optional text field
    pub fn text(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Categorical fields sometimes arrive as numbers (e.g. slope in percent)
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Int(i)) => Some(i.to_string()),
        Some(Raw::Float(f)) => Some(f.to_string()),
    })
}
