//! Route definitions for the Crop Advisory Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create the advisory routes, one nested router per task
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/fertilizer", fertilizer_routes())
        .nest("/irrigation", irrigation_routes())
        .nest("/pest_control", pest_routes())
        .nest("/yield_prediction", yield_routes())
}

fn fertilizer_routes() -> Router<AppState> {
    Router::new().route("/predict", post(handlers::predict_fertilizer))
}

fn irrigation_routes() -> Router<AppState> {
    Router::new().route("/predict", post(handlers::predict_irrigation))
}

fn pest_routes() -> Router<AppState> {
    Router::new().route("/predict", post(handlers::predict_pest_risk))
}

fn yield_routes() -> Router<AppState> {
    Router::new()
        .route("/predict", post(handlers::predict_yield))
        .route("/features", get(handlers::yield_features))
}
