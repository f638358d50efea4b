//! Predictor outputs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw predictor output: a class label or a regression value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PredictionValue {
    Label(String),
    Value(f64),
}

impl PredictionValue {
    pub fn as_label(&self) -> Option<&str> {
        match self {
            PredictionValue::Label(label) => Some(label),
            PredictionValue::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            PredictionValue::Label(_) => None,
            PredictionValue::Value(v) => Some(*v),
        }
    }
}

impl std::fmt::Display for PredictionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionValue::Label(label) => write!(f, "{}", label),
            PredictionValue::Value(v) => write!(f, "{:.2}", v),
        }
    }
}

/// A prediction plus, for classifiers, the per-class distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub value: PredictionValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
}

impl Prediction {
    /// Probabilities rounded to three decimals for display
    pub fn rounded_probabilities(&self) -> Option<BTreeMap<String, f64>> {
        self.probabilities.as_ref().map(|probs| {
            probs
                .iter()
                .map(|(class, p)| (class.clone(), round_to(*p, 3)))
                .collect()
        })
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
