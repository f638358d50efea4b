//! HTTP surface tests driven through the router with stubbed providers

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use crop_advisory::{create_app, AppState};
use serde_json::{json, Value};
use shared::WeatherSummary;
use tower::ServiceExt;

fn app() -> Router {
    create_app(AppState::new(service()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Index and health
// ============================================================================

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = send(app(), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_endpoints"]["pest_control"], "/pest_control/predict");
    assert_eq!(body["available_endpoints"]["yield_prediction"], "/yield_prediction/predict");
}

#[tokio::test]
async fn test_health_reports_models() {
    let (status, body) = send(app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 4);
    assert!(models.iter().all(|m| m["sha256"].as_str().unwrap().len() == 64));
}

#[tokio::test]
async fn test_yield_features_in_declared_order() {
    let (status, body) = send(app(), get("/yield_prediction/features")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["features"],
        json!(["year", "temperature_c", "crop", "area_ha", "n_req_kg_per_ha", "ph"])
    );
}

// ============================================================================
// Predictions
// ============================================================================

#[tokio::test]
async fn test_pest_prediction_response_shape() {
    let request = post_json(
        "/pest_control/predict",
        r#"{"Crop":"rice","Variety":"basmati","Growth_Stage":"Flowering",
            "State":"Maharashtra","District":"Nagpur"}"#,
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Low");
    assert_eq!(body["task"], "pest");
    assert_eq!(body["state"], "Maharashtra");
    assert_eq!(body["inputs_used"]["Temperature"], 27.5);
    assert_eq!(body["soil"]["source"], "remote");
    assert!(body["suggestion"].as_str().unwrap().len() > 10);
    assert!(body.get("total_prediction").is_none());
}

#[tokio::test]
async fn test_yield_prediction_reports_total() {
    let request = post_json(
        "/yield_prediction/predict",
        r#"{"crop":"rice","state_name":"Maharashtra","dist_name":"Nagpur","area_in_acres":2}"#,
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 1234.57);
    assert_eq!(body["total_prediction"], 2469.13);
    assert!(body.get("prediction_proba").is_none());
}

#[tokio::test]
async fn test_fertilizer_prediction_names_product() {
    let request = post_json(
        "/fertilizer/predict",
        r#"{"crop":"wheat","state":"Maharashtra","district":"Nagpur","N":90,"P":42,"K":43}"#,
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "DAP");
    assert!(body["fertilizer_full"].as_str().unwrap().starts_with("Diammonium"));
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, body) = send(app(), post_json("/irrigation/predict", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_area_fails_validation() {
    let request = post_json(
        "/yield_prediction/predict",
        r#"{"crop":"rice","state":"Maharashtra","district":"Nagpur","area_acres":-3}"#,
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let request = post_json("/pest_control/predict", r#"{"Crop":"rice"}"#);
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_unknown_location_is_not_found() {
    let mut providers = providers(vertisol());
    providers.geocoder = Arc::new(StubGeocoder { location: None });
    let app = create_app(AppState::new(service_with(providers, reference())));

    let request = post_json(
        "/pest_control/predict",
        r#"{"Crop":"rice","Variety":"basmati","Growth_Stage":"Flowering",
            "State":"Atlantis","District":"Nowhere"}"#,
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "LOCATION_NOT_FOUND");
}

#[tokio::test]
async fn test_weather_outage_is_service_unavailable() {
    let mut providers = providers(vertisol());
    providers.weather = Arc::new(StubWeather { summary: None });
    let app = create_app(AppState::new(service_with(providers, reference())));

    let request = post_json(
        "/fertilizer/predict",
        r#"{"crop":"rice","state":"Maharashtra","district":"Nagpur","N":1,"P":1,"K":1}"#,
    );
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_weather_parameter_without_readings_is_service_unavailable() {
    let mut providers = providers(vertisol());
    providers.weather = Arc::new(StubWeather {
        summary: Some(WeatherSummary {
            humidity: f64::NAN,
            ..nagpur_weather()
        }),
    });
    let app = create_app(AppState::new(service_with(providers, reference())));

    let request = post_json(
        "/pest_control/predict",
        r#"{"Crop":"rice","Variety":"basmati","Growth_Stage":"Flowering",
            "State":"Maharashtra","District":"Nagpur"}"#,
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "WEATHER_SERVICE_UNAVAILABLE");
}
