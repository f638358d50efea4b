//! Crop Advisory Platform - backend library
//!
//! Turns farm inputs (crop, location, area) into fertilizer, irrigation,
//! pest-risk and yield recommendations by combining geospatial and weather
//! lookups with pre-trained tabular models.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod data;
pub mod error;
pub mod external;
pub mod handlers;
pub mod ml;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::AdvisoryService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub advisory: Arc<AdvisoryService>,
}

impl AppState {
    pub fn new(advisory: AdvisoryService) -> Self {
        Self {
            advisory: Arc::new(advisory),
        }
    }

    /// Build providers, load reference data and models
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self::new(AdvisoryService::from_config(config)?))
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
