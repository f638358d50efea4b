//! Health check and index handlers

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use shared::Task;

use crate::ml::ModelInfo;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models: Vec<ModelInfo>,
}

/// Root endpoint listing the advisory routes
pub async fn root() -> Json<Value> {
    let endpoints: serde_json::Map<String, Value> = Task::ALL
        .iter()
        .map(|task| {
            let prefix = task.route_prefix();
            (
                prefix.trim_start_matches('/').to_string(),
                Value::String(format!("{}/predict", prefix)),
            )
        })
        .collect();

    Json(json!({
        "message": "Crop Advisory API is running",
        "available_endpoints": endpoints,
    }))
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: state.advisory.models().info().to_vec(),
    })
}
