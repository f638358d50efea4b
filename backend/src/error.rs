//! Error handling for the Crop Advisory Platform
//!
//! Every failure a request can hit ends up as an [`AppError`], which renders
//! as a non-2xx `{"error": ..., "code": ...}` body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ml::ModelError;
use crate::services::features::AssemblyError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Location errors
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    // External service errors
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Weather service unavailable: {0}")]
    WeatherServiceUnavailable(String),

    // Request errors
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid model input: {0}")]
    InvalidModelInput(String),

    // Startup errors
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// HTTP status and stable machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::LocationNotFound(_) => (StatusCode::NOT_FOUND, "LOCATION_NOT_FOUND"),
            AppError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
            AppError::WeatherServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "WEATHER_SERVICE_UNAVAILABLE")
            }
            AppError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_BODY"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            AppError::SchemaMismatch(_) => (StatusCode::BAD_REQUEST, "SCHEMA_MISMATCH"),
            AppError::InvalidModelInput(_) => (StatusCode::BAD_REQUEST, "INVALID_MODEL_INPUT"),
            AppError::ModelLoad(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MODEL_LOAD_ERROR"),
            AppError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, "Request failed: {}", self);
        } else {
            tracing::warn!(code, "Request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl From<AssemblyError> for AppError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::SchemaMismatch { .. } => AppError::SchemaMismatch(err.to_string()),
            AssemblyError::MissingField(field) => AppError::MissingField(field),
            AssemblyError::NonFinite(_) => AppError::InvalidModelInput(err.to_string()),
            AssemblyError::WeatherUnavailable(_) => {
                AppError::WeatherServiceUnavailable(err.to_string())
            }
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        if err.is_request_error() {
            AppError::InvalidModelInput(err.to_string())
        } else {
            AppError::ModelLoad(err.to_string())
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
