//! Open-Meteo precipitation forecast

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::Location;

use super::{fetch_json, RainfallForecast};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyForecast,
}

#[derive(Debug, Deserialize)]
struct DailyForecast {
    precipitation_sum: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://api.open-meteo.com".to_string())
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl RainfallForecast for OpenMeteoClient {
    async fn next_days_rainfall(&self, location: Location, days: u32) -> AppResult<f64> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let days = days.to_string();
        let request = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("daily", "precipitation_sum"),
                ("forecast_days", days.as_str()),
                ("timezone", "auto"),
            ]);

        let data: ForecastResponse = fetch_json(request, "Open-Meteo forecast")
            .await
            .map_err(AppError::UpstreamUnavailable)?;
        Ok(total_precipitation(&data.daily))
    }
}

fn total_precipitation(daily: &DailyForecast) -> f64 {
    daily.precipitation_sum.iter().flatten().sum()
}
