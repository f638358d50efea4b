//! HTTP handlers for the advisory endpoints

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use shared::{FarmInputs, Task};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::Advisory;
use crate::AppState;

/// JSON body extractor whose rejections render as [`AppError`]
type Body = WithRejection<Json<FarmInputs>, AppError>;

async fn predict(state: &AppState, task: Task, inputs: FarmInputs) -> AppResult<Json<Advisory>> {
    inputs.validate()?;
    let advisory = state.advisory.run(task, &inputs).await?;
    Ok(Json(advisory))
}

/// Recommend a fertilizer
pub async fn predict_fertilizer(
    State(state): State<AppState>,
    WithRejection(Json(inputs), _): Body,
) -> AppResult<Json<Advisory>> {
    predict(&state, Task::Fertilizer, inputs).await
}

/// Recommend an irrigation method
pub async fn predict_irrigation(
    State(state): State<AppState>,
    WithRejection(Json(inputs), _): Body,
) -> AppResult<Json<Advisory>> {
    predict(&state, Task::Irrigation, inputs).await
}

/// Estimate pest risk
pub async fn predict_pest_risk(
    State(state): State<AppState>,
    WithRejection(Json(inputs), _): Body,
) -> AppResult<Json<Advisory>> {
    predict(&state, Task::Pest, inputs).await
}

/// Predict crop yield
pub async fn predict_yield(
    State(state): State<AppState>,
    WithRejection(Json(inputs), _): Body,
) -> AppResult<Json<Advisory>> {
    predict(&state, Task::Yield, inputs).await
}

#[derive(Serialize)]
pub struct FeatureListResponse {
    pub features: Vec<String>,
}

/// Features the loaded yield model was trained on
pub async fn yield_features(State(state): State<AppState>) -> AppResult<Json<FeatureListResponse>> {
    let features = state.advisory.feature_names(Task::Yield)?;
    Ok(Json(FeatureListResponse { features }))
}
