//! External API integrations
//!
//! Each provider sits behind a trait so the advisory pipeline can be driven
//! with stubs. All clients share one `reqwest::Client`.

pub mod agromonitoring;
pub mod geocoding;
pub mod nasa_power;
pub mod open_meteo;
pub mod soilgrids;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{Location, WeatherSummary};

use crate::config::HttpConfig;
use crate::error::{AppError, AppResult};

pub use agromonitoring::AgroMonitoringClient;
pub use geocoding::NominatimClient;
pub use nasa_power::NasaPowerClient;
pub use open_meteo::OpenMeteoClient;
pub use soilgrids::SoilGridsClient;

/// Turns a free-text place into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, state: &str, district: &str, country: &str) -> AppResult<Location>;
}

/// Historical weather reduced to per-parameter means
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn summarize(
        &self,
        location: Location,
        window: WeatherWindow,
    ) -> AppResult<WeatherSummary>;
}

/// Upcoming precipitation
#[async_trait]
pub trait RainfallForecast: Send + Sync {
    /// Total forecast rainfall in mm over the next `days` days
    async fn next_days_rainfall(&self, location: Location, days: u32) -> AppResult<f64>;
}

/// Point soil properties
#[async_trait]
pub trait SoilPropertiesSource: Send + Sync {
    /// Topsoil pH, if the service has a value for this point
    async fn ph(&self, location: Location) -> AppResult<Option<f64>>;

    /// Most probable WRB reference soil group
    async fn wrb_class(&self, location: Location) -> AppResult<Option<String>>;
}

/// Inclusive range of archive days to summarize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeatherWindow {
    /// Window of `window_days` ending `latency_days` before `today`
    pub fn ending_before(today: NaiveDate, latency_days: u32, window_days: u32) -> Self {
        let end = today - chrono::Duration::days(i64::from(latency_days));
        let start = end - chrono::Duration::days(i64::from(window_days));
        Self { start, end }
    }

    /// Number of calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Build the shared outbound client
pub fn http_client(config: &HttpConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, describing any failure
async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: &str,
) -> Result<T, String> {
    let response = request
        .send()
        .await
        .map_err(|e| format!("{} request failed: {}", service, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("{} error: {} - {}", service, status, body));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse {} response: {}", service, e))
}
