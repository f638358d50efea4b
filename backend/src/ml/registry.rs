//! Process-wide model registry

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::Task;

use super::{ModelError, Predictor, TrainedModel};
use crate::config::ModelsConfig;

/// Loaded-model summary reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub task: Task,
    pub name: String,
    pub path: String,
    pub sha256: String,
}

/// One predictor per task, immutable after startup
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<Task, Arc<dyn Predictor>>,
    info: Vec<ModelInfo>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every task's artifact; any failure aborts startup
    pub fn load(config: &ModelsConfig) -> Result<Self, ModelError> {
        let yield_path = select_yield_bundle(&config.yield_dir, &config.yield_results)?;

        let mut registry = Self::new();
        for (task, path) in [
            (Task::Fertilizer, config.fertilizer.clone()),
            (Task::Irrigation, config.irrigation.clone()),
            (Task::Pest, config.pest.clone()),
            (Task::Yield, yield_path),
        ] {
            let model = TrainedModel::from_path(&path)?;
            if model.classes().is_empty() == task.is_classification() {
                return Err(ModelError::Invalid(format!(
                    "{} is not a {} model",
                    path.display(),
                    if task.is_classification() {
                        "classification"
                    } else {
                        "regression"
                    }
                )));
            }

            tracing::info!(
                task = %task,
                model = model.name(),
                path = %path.display(),
                sha256 = model.digest(),
                "Loaded model"
            );
            let info = ModelInfo {
                task,
                name: model.name().to_string(),
                path: path.display().to_string(),
                sha256: model.digest().to_string(),
            };
            registry.insert(task, Arc::new(model), info);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, task: Task, predictor: Arc<dyn Predictor>, info: ModelInfo) {
        self.info.retain(|i| i.task != task);
        self.info.push(info);
        self.info.sort_by_key(|i| i.task);
        self.models.insert(task, predictor);
    }

    pub fn get(&self, task: Task) -> Option<Arc<dyn Predictor>> {
        self.models.get(&task).cloned()
    }

    pub fn info(&self) -> &[ModelInfo] {
        &self.info
    }
}

/// One row of the results table. Tables written with the model names as the
/// index carry an empty first header, which is read as the model column.
#[derive(Debug, Deserialize)]
struct ResultRow {
    #[serde(alias = "")]
    model: String,
    #[serde(rename = "MSE")]
    mse: f64,
}

/// Pick the lowest-MSE yield model listed in the results table.
///
/// The table needs a `MSE` column and a model column headed `model` or left
/// blank. The bundle for model "Random Forest" is `Random_Forest_pipeline.json`.
pub fn select_yield_bundle(dir: &Path, results_file: &str) -> Result<PathBuf, ModelError> {
    let results_path = dir.join(results_file);
    let mut reader = csv::Reader::from_path(&results_path).map_err(|e| {
        ModelError::Results(format!("{}: {}", results_path.display(), e))
    })?;

    let mut best: Option<ResultRow> = None;
    for row in reader.deserialize::<ResultRow>() {
        let row = row
            .map_err(|e| ModelError::Results(format!("{}: {}", results_path.display(), e)))?;
        if row.mse.is_nan() {
            continue;
        }
        if best.as_ref().map_or(true, |b| row.mse < b.mse) {
            best = Some(row);
        }
    }

    let best = best.ok_or_else(|| {
        ModelError::Results(format!("{} lists no usable models", results_path.display()))
    })?;
    tracing::info!(model = %best.model, mse = best.mse, "Selected yield model");

    Ok(dir.join(format!("{}_pipeline.json", best.model.trim().replace(' ', "_"))))
}
