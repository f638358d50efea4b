//! Trained model artifacts and inference
//!
//! Models are trained offline and exported as JSON bundles (see [`bundle`]).
//! Each bundle is loaded once at startup into a [`TrainedModel`] and shared
//! read-only across requests through the [`ModelRegistry`].

pub mod bundle;
pub mod estimator;
pub mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;

use shared::Prediction;
use thiserror::Error;

pub use bundle::{CategoricalEncoding, FeatureEncoder, ModelBundle};
pub use estimator::TrainedModel;
pub use registry::{ModelInfo, ModelRegistry};

/// Errors raised while loading artifacts or running inference
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("Model results table unusable: {0}")]
    Results(String),

    #[error("Expected {expected} input columns, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Input column {0} is not a finite number")]
    NonFinite(usize),

    #[error("Model does not produce class probabilities")]
    NotAClassifier,
}

impl ModelError {
    /// Errors caused by the row a request produced rather than the artifact
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ModelError::WidthMismatch { .. } | ModelError::NonFinite(_)
        )
    }
}

/// Declared inputs of a trained model
#[derive(Debug, Clone)]
pub struct ModelSchema {
    /// Feature names in training order
    pub features: Vec<String>,
    /// One encoder per feature, parallel to `features`
    pub encoders: Vec<FeatureEncoder>,
}

impl ModelSchema {
    /// Width of the encoded numeric row
    pub fn input_width(&self) -> usize {
        self.encoders.iter().map(FeatureEncoder::width).sum()
    }
}

/// A loaded model usable for inference
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> &ModelSchema;

    /// Predict from an already-encoded row
    fn predict(&self, row: &[f64]) -> Result<Prediction, ModelError>;

    /// Class distribution for classifiers
    fn predict_proba(&self, row: &[f64]) -> Result<BTreeMap<String, f64>, ModelError>;
}
