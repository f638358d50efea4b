//! AgroMonitoring weather history and soil client
//!
//! Alternate weather provider. It reports no solar radiation or wind, so the
//! summary it yields carries NaN for both.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use shared::{nan_mean, AgroWeatherSummary, Location, WeatherSummary};

use super::{fetch_json, WeatherSource, WeatherWindow};
use crate::error::{AppError, AppResult};

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Clone)]
pub struct AgroMonitoringClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HistoryItem {
    main: HistoryMain,
    #[serde(default)]
    rain: Option<HistoryRain>,
}

#[derive(Debug, Deserialize)]
struct HistoryMain {
    /// Kelvin
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryRain {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SoilReading {
    /// Kelvin, surface
    t0: Option<f64>,
    /// m3/m3
    moisture: Option<f64>,
}

impl AgroMonitoringClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(
            client,
            api_key,
            "https://api.agromonitoring.com/agro/1.0".to_string(),
        )
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Weather history plus current soil state
    pub async fn fetch(
        &self,
        location: Location,
        window: WeatherWindow,
    ) -> AppResult<AgroWeatherSummary> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let start = unix_start_of(window.start).to_string();
        let end = unix_start_of(window.end + chrono::Duration::days(1)).to_string();

        let history_request = self
            .client
            .get(format!("{}/weather/history", self.base_url))
            .query(&[
                ("lat", latitude.as_str()),
                ("lon", longitude.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("appid", self.api_key.as_str()),
            ]);
        let history: Vec<HistoryItem> = fetch_json(history_request, "AgroMonitoring")
            .await
            .map_err(AppError::WeatherServiceUnavailable)?;

        let soil_request = self
            .client
            .get(format!("{}/soil", self.base_url))
            .query(&[
                ("lat", latitude.as_str()),
                ("lon", longitude.as_str()),
                ("appid", self.api_key.as_str()),
            ]);
        let soil = match fetch_json::<SoilReading>(soil_request, "AgroMonitoring soil").await {
            Ok(soil) => Some(soil),
            Err(e) => {
                tracing::warn!(error = %e, "AgroMonitoring soil reading unavailable");
                None
            }
        };

        summarize_history(&history, soil.as_ref(), window.days())
            .map_err(AppError::WeatherServiceUnavailable)
    }
}

#[async_trait]
impl WeatherSource for AgroMonitoringClient {
    async fn summarize(
        &self,
        location: Location,
        window: WeatherWindow,
    ) -> AppResult<WeatherSummary> {
        Ok(self.fetch(location, window).await?.into())
    }
}

fn unix_start_of(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn summarize_history(
    history: &[HistoryItem],
    soil: Option<&SoilReading>,
    days: i64,
) -> Result<AgroWeatherSummary, String> {
    if history.is_empty() {
        return Err("AgroMonitoring returned no observations".to_string());
    }

    let temperature = nan_mean(
        history
            .iter()
            .map(|h| h.main.temp.map_or(f64::NAN, |k| k - KELVIN_OFFSET)),
    );
    let humidity = nan_mean(history.iter().map(|h| h.main.humidity.unwrap_or(f64::NAN)));
    let total_rain: f64 = history
        .iter()
        .filter_map(|h| h.rain.as_ref().and_then(|r| r.three_hour))
        .sum();

    Ok(AgroWeatherSummary {
        temperature,
        humidity,
        rainfall: total_rain / days.max(1) as f64,
        soil_moisture: soil.and_then(|s| s.moisture),
        soil_temperature: soil.and_then(|s| s.t0).map(|k| k - KELVIN_OFFSET),
    })
}
