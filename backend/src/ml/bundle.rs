//! On-disk model bundle format
//!
//! ```json
//! {
//!   "name": "pest_risk",
//!   "features": ["Crop", "Temperature"],
//!   "preprocessor": {
//!     "Crop": {"type": "categorical", "classes": ["Cotton", "Rice"], "encoding": "one_hot"},
//!     "Temperature": {"type": "numeric", "center": 27.0, "scale": 4.0}
//!   },
//!   "target_classes": ["High", "Low", "Medium"],
//!   "estimator": {"type": "forest", "mode": "classification", "trees": [...]}
//! }
//! ```
//!
//! Features missing from `preprocessor` pass through as raw numbers.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::ModelError;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelBundle {
    pub name: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub preprocessor: BTreeMap<String, FeatureEncoder>,
    /// Empty for regressors
    #[serde(default)]
    pub target_classes: Vec<String>,
    pub estimator: Estimator,
}

// ============================================================================
// Preprocessing
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalEncoding {
    #[default]
    Ordinal,
    OneHot,
}

/// Training-time transform for a single feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureEncoder {
    Numeric {
        #[serde(default)]
        center: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    Categorical {
        classes: Vec<String>,
        /// Substitute for categories unseen at training time; first class when absent
        #[serde(default)]
        fallback: Option<String>,
        #[serde(default)]
        encoding: CategoricalEncoding,
    },
}

fn unit_scale() -> f64 {
    1.0
}

impl FeatureEncoder {
    pub fn passthrough() -> Self {
        FeatureEncoder::Numeric {
            center: 0.0,
            scale: 1.0,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureEncoder::Categorical { .. })
    }

    /// Number of row columns this feature occupies
    pub fn width(&self) -> usize {
        match self {
            FeatureEncoder::Numeric { .. } => 1,
            FeatureEncoder::Categorical {
                classes,
                encoding: CategoricalEncoding::OneHot,
                ..
            } => classes.len(),
            FeatureEncoder::Categorical { .. } => 1,
        }
    }

    pub fn scale_number(&self, value: f64) -> f64 {
        match self {
            FeatureEncoder::Numeric { center, scale } => (value - center) / scale,
            FeatureEncoder::Categorical { .. } => value,
        }
    }

    /// Index of `category` among the training classes.
    ///
    /// Returns the index and whether the fallback class was substituted.
    pub fn category_index(&self, category: &str) -> (usize, bool) {
        let FeatureEncoder::Categorical {
            classes, fallback, ..
        } = self
        else {
            return (0, true);
        };

        match classes.iter().position(|c| c == category) {
            Some(index) => (index, false),
            None => {
                let index = fallback
                    .as_deref()
                    .and_then(|f| classes.iter().position(|c| c == f))
                    .unwrap_or(0);
                (index, true)
            }
        }
    }

    /// Append this feature's encoded columns for a categorical value
    pub fn push_category(&self, category: &str, row: &mut Vec<f64>) -> bool {
        let (index, substituted) = self.category_index(category);
        match self {
            FeatureEncoder::Categorical {
                classes,
                encoding: CategoricalEncoding::OneHot,
                ..
            } => row.extend((0..classes.len()).map(|i| if i == index { 1.0 } else { 0.0 })),
            _ => row.push(index as f64),
        }
        substituted
    }

    fn validate(&self, feature: &str) -> Result<(), ModelError> {
        match self {
            FeatureEncoder::Numeric { center, scale } => {
                if !center.is_finite() || !scale.is_finite() || *scale == 0.0 {
                    return Err(ModelError::Invalid(format!(
                        "feature '{}' has a degenerate numeric scaler",
                        feature
                    )));
                }
            }
            FeatureEncoder::Categorical {
                classes, fallback, ..
            } => {
                if classes.is_empty() {
                    return Err(ModelError::Invalid(format!(
                        "categorical feature '{}' has no classes",
                        feature
                    )));
                }
                if let Some(f) = fallback {
                    if !classes.contains(f) {
                        return Err(ModelError::Invalid(format!(
                            "fallback '{}' of feature '{}' is not a known class",
                            f, feature
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Estimators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestMode {
    Classification,
    Regression,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    /// One coefficient row per class (softmax), or a single row for regression
    /// and binary logistic models
    Linear {
        intercept: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    },
    Forest {
        mode: ForestMode,
        trees: Vec<Tree>,
    },
    /// Averages the outputs of its members
    Bagging { estimators: Vec<Estimator> },
}

/// Decision tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Go left when `row[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: Vec<f64> },
}

impl Estimator {
    /// Check structural soundness against the encoded row width and output size
    pub(crate) fn validate(&self, width: usize, outputs: usize) -> Result<(), ModelError> {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                let rows = if outputs <= 2 { 1 } else { outputs };
                if coefficients.len() != rows || intercept.len() != rows {
                    return Err(ModelError::Invalid(format!(
                        "linear estimator needs {} coefficient rows, found {}",
                        rows,
                        coefficients.len()
                    )));
                }
                if coefficients.iter().any(|c| c.len() != width) {
                    return Err(ModelError::Invalid(format!(
                        "linear coefficients must have {} columns",
                        width
                    )));
                }
                Ok(())
            }
            Estimator::Forest { trees, .. } => {
                if trees.is_empty() {
                    return Err(ModelError::Invalid("forest has no trees".into()));
                }
                trees.iter().try_for_each(|t| t.validate(width, outputs))
            }
            Estimator::Bagging { estimators } => {
                if estimators.is_empty() {
                    return Err(ModelError::Invalid("bagging has no members".into()));
                }
                estimators.iter().try_for_each(|e| e.validate(width, outputs))
            }
        }
    }
}

impl Tree {
    fn validate(&self, width: usize, outputs: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid("tree has no nodes".into()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    threshold,
                } => {
                    // children must come after their parent, which rules out cycles
                    let in_range = |child: usize| child > index && child < self.nodes.len();
                    if *feature >= width || !in_range(*left) || !in_range(*right) {
                        return Err(ModelError::Invalid(format!(
                            "split node {} references out-of-range column or child",
                            index
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::Invalid(format!(
                            "split node {} has NaN threshold",
                            index
                        )));
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != outputs.max(1) {
                        return Err(ModelError::Invalid(format!(
                            "leaf node {} has {} outputs, expected {}",
                            index,
                            value.len(),
                            outputs.max(1)
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl ModelBundle {
    /// Encoder for each declared feature, in declared order
    pub fn encoders(&self) -> Vec<FeatureEncoder> {
        self.features
            .iter()
            .map(|f| {
                self.preprocessor
                    .get(f)
                    .cloned()
                    .unwrap_or_else(FeatureEncoder::passthrough)
            })
            .collect()
    }

    pub fn is_classifier(&self) -> bool {
        !self.target_classes.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if self.features.is_empty() {
            return Err(ModelError::Invalid(format!(
                "model '{}' declares no features",
                self.name
            )));
        }
        for name in self.preprocessor.keys() {
            if !self.features.contains(name) {
                return Err(ModelError::Invalid(format!(
                    "preprocessor entry '{}' is not a declared feature",
                    name
                )));
            }
        }
        for (name, encoder) in &self.preprocessor {
            encoder.validate(name)?;
        }

        let width = self.encoders().iter().map(FeatureEncoder::width).sum();
        self.estimator.validate(width, self.target_classes.len())?;

        if let Estimator::Forest { mode, .. } = &self.estimator {
            let consistent = match mode {
                ForestMode::Classification => self.is_classifier(),
                ForestMode::Regression => !self.is_classifier(),
            };
            if !consistent {
                return Err(ModelError::Invalid(format!(
                    "forest mode {:?} disagrees with target classes of '{}'",
                    mode, self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(value: serde_json::Value) -> ModelBundle {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parses_and_validates_forest_bundle() {
        let b = bundle(json!({
            "name": "pest",
            "features": ["Crop", "Temperature"],
            "preprocessor": {
                "Crop": {"type": "categorical", "classes": ["Cotton", "Rice"], "encoding": "one_hot"}
            },
            "target_classes": ["High", "Low"],
            "estimator": {
                "type": "forest",
                "mode": "classification",
                "trees": [{"nodes": [
                    {"split": {"feature": 2, "threshold": 30.0, "left": 1, "right": 2}},
                    {"leaf": {"value": [0.1, 0.9]}},
                    {"leaf": {"value": [0.8, 0.2]}}
                ]}]
            }
        }));

        assert!(b.validate().is_ok());
        let widths: usize = b.encoders().iter().map(FeatureEncoder::width).sum();
        assert_eq!(widths, 3);
        assert_eq!(b.encoders()[1], FeatureEncoder::passthrough());
    }

    #[test]
    fn test_rejects_backwards_child_reference() {
        let b = bundle(json!({
            "name": "loop",
            "features": ["x"],
            "estimator": {
                "type": "forest",
                "mode": "regression",
                "trees": [{"nodes": [
                    {"split": {"feature": 0, "threshold": 1.0, "left": 0, "right": 1}},
                    {"leaf": {"value": [1.0]}}
                ]}]
            }
        }));
        assert!(matches!(b.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_fallback() {
        let b = bundle(json!({
            "name": "f",
            "features": ["crop"],
            "preprocessor": {
                "crop": {"type": "categorical", "classes": ["rice"], "fallback": "wheat"}
            },
            "estimator": {"type": "linear", "intercept": [0.0], "coefficients": [[1.0]]}
        }));
        assert!(b.validate().is_err());
    }

    #[test]
    fn test_category_index_uses_fallback() {
        let encoder = FeatureEncoder::Categorical {
            classes: vec!["maize".into(), "rice".into(), "wheat".into()],
            fallback: Some("rice".into()),
            encoding: CategoricalEncoding::Ordinal,
        };
        assert_eq!(encoder.category_index("wheat"), (2, false));
        assert_eq!(encoder.category_index("quinoa"), (1, true));

        let no_fallback = FeatureEncoder::Categorical {
            classes: vec!["maize".into(), "rice".into()],
            fallback: None,
            encoding: CategoricalEncoding::Ordinal,
        };
        assert_eq!(no_fallback.category_index("quinoa"), (0, true));
    }

    #[test]
    fn test_one_hot_columns() {
        let encoder = FeatureEncoder::Categorical {
            classes: vec!["clay".into(), "loamy".into(), "sandy".into()],
            fallback: None,
            encoding: CategoricalEncoding::OneHot,
        };
        let mut row = vec![];
        assert!(!encoder.push_category("sandy", &mut row));
        assert_eq!(row, vec![0.0, 0.0, 1.0]);
    }
}
