//! Macro-nutrient (NPK) estimates

use serde::{Deserialize, Serialize};

/// Nitrogen / phosphorus / potassium levels, kg/ha
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NpkEstimate {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

/// Level bucket used by the fertilizer advice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientLevel {
    Low,
    Adequate,
    High,
}

impl NutrientLevel {
    /// Below 50 is low, above 100 is high
    pub fn classify(value: f64) -> Self {
        if value < 50.0 {
            NutrientLevel::Low
        } else if value > 100.0 {
            NutrientLevel::High
        } else {
            NutrientLevel::Adequate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrient_level_boundaries() {
        assert_eq!(NutrientLevel::classify(49.9), NutrientLevel::Low);
        assert_eq!(NutrientLevel::classify(50.0), NutrientLevel::Adequate);
        assert_eq!(NutrientLevel::classify(100.0), NutrientLevel::Adequate);
        assert_eq!(NutrientLevel::classify(100.1), NutrientLevel::High);
    }
}
