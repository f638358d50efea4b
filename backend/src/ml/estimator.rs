//! Inference over loaded bundles

use std::collections::BTreeMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use shared::{Prediction, PredictionValue};

use super::bundle::{Estimator, ForestMode, ModelBundle, Node, Tree};
use super::{ModelError, ModelSchema, Predictor};

/// A validated model bundle ready for inference
#[derive(Debug, Clone)]
pub struct TrainedModel {
    name: String,
    schema: ModelSchema,
    classes: Vec<String>,
    estimator: Estimator,
    digest: String,
}

impl TrainedModel {
    /// Read, hash and validate a bundle file
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: ModelBundle =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let digest = format!("{:x}", Sha256::digest(&bytes));
        Self::from_bundle(bundle, digest)
    }

    pub fn from_bundle(bundle: ModelBundle, digest: String) -> Result<Self, ModelError> {
        bundle.validate()?;
        let schema = ModelSchema {
            encoders: bundle.encoders(),
            features: bundle.features,
        };
        Ok(Self {
            name: bundle.name,
            schema,
            classes: bundle.target_classes,
            estimator: bundle.estimator,
            digest,
        })
    }

    /// SHA-256 of the artifact bytes, hex encoded
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn is_classifier(&self) -> bool {
        !self.classes.is_empty()
    }

    fn check_row(&self, row: &[f64]) -> Result<(), ModelError> {
        let expected = self.schema.input_width();
        if row.len() != expected {
            return Err(ModelError::WidthMismatch {
                expected,
                actual: row.len(),
            });
        }
        match row.iter().position(|v| !v.is_finite()) {
            Some(column) => Err(ModelError::NonFinite(column)),
            None => Ok(()),
        }
    }

    fn distribution(&self, row: &[f64]) -> Vec<f64> {
        evaluate(&self.estimator, row, self.classes.len())
    }
}

impl Predictor for TrainedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn predict(&self, row: &[f64]) -> Result<Prediction, ModelError> {
        self.check_row(row)?;
        let output = self.distribution(row);

        if !self.is_classifier() {
            let value = output.first().copied().unwrap_or(f64::NAN);
            return Ok(Prediction {
                value: PredictionValue::Value(value),
                probabilities: None,
            });
        }

        // ties resolve to the earliest class
        let best = output
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > output[best] { i } else { best });
        let probabilities = self.classes.iter().cloned().zip(output.iter().copied()).collect();

        Ok(Prediction {
            value: PredictionValue::Label(self.classes[best].clone()),
            probabilities: Some(probabilities),
        })
    }

    fn predict_proba(&self, row: &[f64]) -> Result<BTreeMap<String, f64>, ModelError> {
        if !self.is_classifier() {
            return Err(ModelError::NotAClassifier);
        }
        self.check_row(row)?;
        let output = self.distribution(row);
        Ok(self.classes.iter().cloned().zip(output).collect())
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Class distribution (classifiers) or single-element value (regressors)
fn evaluate(estimator: &Estimator, row: &[f64], classes: usize) -> Vec<f64> {
    match estimator {
        Estimator::Linear {
            intercept,
            coefficients,
        } => {
            let scores: Vec<f64> = coefficients
                .iter()
                .zip(intercept)
                .map(|(coef, b)| b + coef.iter().zip(row).map(|(c, x)| c * x).sum::<f64>())
                .collect();
            match classes {
                0 => scores,
                2 if scores.len() == 1 => {
                    let p = sigmoid(scores[0]);
                    vec![1.0 - p, p]
                }
                _ => softmax(&scores),
            }
        }
        Estimator::Forest { mode, trees } => {
            let outputs: Vec<Vec<f64>> = trees
                .iter()
                .map(|tree| {
                    let leaf = tree.leaf_for(row);
                    match mode {
                        ForestMode::Classification => normalize(leaf),
                        ForestMode::Regression => leaf.to_vec(),
                    }
                })
                .collect();
            average(&outputs)
        }
        Estimator::Bagging { estimators } => {
            let outputs: Vec<Vec<f64>> = estimators
                .iter()
                .map(|e| evaluate(e, row, classes))
                .collect();
            average(&outputs)
        }
    }
}

impl Tree {
    fn leaf_for(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        // child indices strictly increase, so the walk terminates
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn normalize(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|v| v / total).collect()
    } else {
        values.to_vec()
    }
}

fn average(outputs: &[Vec<f64>]) -> Vec<f64> {
    let width = outputs.first().map(Vec::len).unwrap_or(0);
    let n = outputs.len().max(1) as f64;
    (0..width)
        .map(|i| outputs.iter().map(|o| o[i]).sum::<f64>() / n)
        .collect()
}
