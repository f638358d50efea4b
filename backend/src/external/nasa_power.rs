//! NASA POWER daily point archive

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{nan_mean, sentinel_to_nan, Location, WeatherSummary, MISSING_VALUE_SENTINEL};

use super::{fetch_json, WeatherSource, WeatherWindow};
use crate::error::{AppError, AppResult};

const TEMPERATURE: &str = "T2M";
const HUMIDITY: &str = "RH2M";
const RAINFALL: &str = "PRECTOTCORR";
const SOLAR_RADIATION: &str = "ALLSKY_SFC_SW_DWN";
const WIND_SPEED: &str = "WS2M";

const PARAMETERS: [&str; 5] = [TEMPERATURE, HUMIDITY, RAINFALL, SOLAR_RADIATION, WIND_SPEED];

#[derive(Clone)]
pub struct NasaPowerClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    #[serde(default)]
    header: Option<PowerHeader>,
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerHeader {
    fill_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    /// Parameter -> YYYYMMDD -> value
    parameter: HashMap<String, BTreeMap<String, Option<f64>>>,
}

impl NasaPowerClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://power.larc.nasa.gov".to_string())
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl WeatherSource for NasaPowerClient {
    async fn summarize(
        &self,
        location: Location,
        window: WeatherWindow,
    ) -> AppResult<WeatherSummary> {
        let start = window.start.format("%Y%m%d").to_string();
        let end = window.end.format("%Y%m%d").to_string();
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let parameters = PARAMETERS.join(",");

        let request = self
            .client
            .get(format!("{}/api/temporal/daily/point", self.base_url))
            .query(&[
                ("parameters", parameters.as_str()),
                ("community", "AG"),
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("format", "JSON"),
            ]);

        let data: PowerResponse = fetch_json(request, "NASA POWER")
            .await
            .map_err(AppError::WeatherServiceUnavailable)?;

        summarize_response(&data).map_err(AppError::WeatherServiceUnavailable)
    }
}

fn summarize_response(data: &PowerResponse) -> Result<WeatherSummary, String> {
    let fill_value = data
        .header
        .as_ref()
        .and_then(|h| h.fill_value)
        .unwrap_or(MISSING_VALUE_SENTINEL);

    let mean_of = |parameter: &str| -> Result<f64, String> {
        let series = data
            .properties
            .parameter
            .get(parameter)
            .ok_or_else(|| format!("NASA POWER response lacks {}", parameter))?;
        Ok(nan_mean(
            series
                .values()
                .map(|v| v.map_or(f64::NAN, |v| sentinel_to_nan(v, fill_value))),
        ))
    };

    Ok(WeatherSummary {
        temperature: mean_of(TEMPERATURE)?,
        humidity: mean_of(HUMIDITY)?,
        rainfall: mean_of(RAINFALL)?,
        solar_radiation: mean_of(SOLAR_RADIATION)?,
        windspeed: mean_of(WIND_SPEED)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> PowerResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summary_excludes_sentinels() {
        let data = response(json!({
            "header": {"fill_value": -999.0},
            "properties": {"parameter": {
                "T2M": {"20240301": 24.0, "20240302": -999.0, "20240303": 26.0},
                "RH2M": {"20240301": 60.0, "20240302": 70.0, "20240303": 80.0},
                "PRECTOTCORR": {"20240301": 0.0, "20240302": 3.0, "20240303": null},
                "ALLSKY_SFC_SW_DWN": {"20240301": -999.0, "20240302": -999.0, "20240303": -999.0},
                "WS2M": {"20240301": 2.0, "20240302": 4.0, "20240303": 3.0}
            }}
        }));

        let summary = summarize_response(&data).unwrap();
        assert_eq!(summary.temperature, 25.0);
        assert_eq!(summary.humidity, 70.0);
        assert_eq!(summary.rainfall, 1.5);
        assert!(summary.solar_radiation.is_nan());
        assert_eq!(summary.windspeed, 3.0);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_missing_header_uses_default_sentinel() {
        let data = response(json!({
            "properties": {"parameter": {
                "T2M": {"20240301": -999.0, "20240302": 30.0},
                "RH2M": {"20240301": 50.0},
                "PRECTOTCORR": {"20240301": 1.0},
                "ALLSKY_SFC_SW_DWN": {"20240301": 20.0},
                "WS2M": {"20240301": 1.0}
            }}
        }));
        assert_eq!(summarize_response(&data).unwrap().temperature, 30.0);
    }

    #[test]
    fn test_missing_parameter_is_malformed() {
        let data = response(json!({
            "properties": {"parameter": {"T2M": {"20240301": 25.0}}}
        }));
        assert!(summarize_response(&data).is_err());
    }
}
