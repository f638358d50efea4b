//! Soil models and the WRB taxonomy mapping

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// pH used when no source yields a value
pub const DEFAULT_SOIL_PH: f64 = 7.0;

/// Coarse soil-type buckets the trained models understand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SoilType {
    Clay,
    Silt,
    Sandy,
    Saline,
    Peaty,
    Loamy,
    #[default]
    Unknown,
}

impl SoilType {
    pub const KNOWN: [SoilType; 6] = [
        SoilType::Clay,
        SoilType::Silt,
        SoilType::Sandy,
        SoilType::Saline,
        SoilType::Peaty,
        SoilType::Loamy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "Clay",
            SoilType::Silt => "Silt",
            SoilType::Sandy => "Sandy",
            SoilType::Saline => "Saline",
            SoilType::Peaty => "Peaty",
            SoilType::Loamy => "Loamy",
            SoilType::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SoilType::Unknown)
    }

    /// Unknown collapses to Loamy, the most common class in the training data
    pub fn or_loamy(self) -> SoilType {
        if self.is_known() {
            self
        } else {
            SoilType::Loamy
        }
    }

    pub fn water_holding_capacity(&self) -> WaterHoldingCapacity {
        match self {
            SoilType::Clay => WaterHoldingCapacity::High,
            SoilType::Sandy => WaterHoldingCapacity::Low,
            _ => WaterHoldingCapacity::Medium,
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SoilType {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unrecognised is `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.trim().to_ascii_lowercase().as_str() {
            "clay" => SoilType::Clay,
            "silt" => SoilType::Silt,
            "sandy" => SoilType::Sandy,
            "saline" => SoilType::Saline,
            "peaty" => SoilType::Peaty,
            "loamy" => SoilType::Loamy,
            _ => SoilType::Unknown,
        };
        Ok(parsed)
    }
}

impl SoilType {
    /// Infallible parse helper
    pub fn parse(s: &str) -> SoilType {
        s.parse().unwrap_or_default()
    }
}

/// How much water a soil retains between irrigations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaterHoldingCapacity {
    High,
    Medium,
    Low,
}

impl WaterHoldingCapacity {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaterHoldingCapacity::High => "high",
            WaterHoldingCapacity::Medium => "medium",
            WaterHoldingCapacity::Low => "low",
        }
    }
}

/// WRB reference soil groups the soil service reports, and their buckets
pub const WRB_SOIL_TYPES: [(&str, SoilType); 11] = [
    ("Vertisols", SoilType::Clay),
    ("Luvisols", SoilType::Clay),
    ("Nitisols", SoilType::Clay),
    ("Fluvisols", SoilType::Silt),
    ("Arenosols", SoilType::Sandy),
    ("Regosols", SoilType::Sandy),
    ("Solonchaks", SoilType::Saline),
    ("Solonetz", SoilType::Saline),
    ("Histosols", SoilType::Peaty),
    ("Cambisols", SoilType::Loamy),
    ("Phaeozems", SoilType::Loamy),
];

/// Map a WRB classification name onto the coarse soil-type buckets
///
/// Matching ignores case and accepts the singular form ("Vertisol").
pub fn map_soil_type(wrb_class: &str) -> SoilType {
    let wanted = wrb_class.trim().to_ascii_lowercase();
    if wanted.is_empty() {
        return SoilType::Unknown;
    }

    WRB_SOIL_TYPES
        .iter()
        .find(|(name, _)| {
            let name = name.to_ascii_lowercase();
            name == wanted || name.strip_suffix('s') == Some(wanted.as_str())
        })
        .map(|(_, soil_type)| *soil_type)
        .unwrap_or(SoilType::Unknown)
}

/// Which fallback tier produced a soil profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SoilSource {
    Remote,
    ReferenceFiltered,
    ReferenceGlobal,
    Default,
}

/// Best-effort soil description for a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilProfile {
    pub ph: f64,
    pub soil_type: SoilType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrb_classification: Option<String>,
    pub source: SoilSource,
}

impl SoilProfile {
    pub fn default_profile() -> Self {
        Self {
            ph: DEFAULT_SOIL_PH,
            soil_type: SoilType::Unknown,
            wrb_classification: None,
            source: SoilSource::Default,
        }
    }
}
