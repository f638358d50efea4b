//! Weather data models

use serde::{Deserialize, Serialize};

/// Marker the weather archive uses for "no observation"
pub const MISSING_VALUE_SENTINEL: f64 = -999.0;

/// Mean weather conditions over a trailing window
///
/// Every field is the arithmetic mean of the valid daily values. A parameter
/// with no valid values at all is NaN rather than zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherSummary {
    /// Air temperature at 2 m, °C
    pub temperature: f64,
    /// Relative humidity at 2 m, %
    pub humidity: f64,
    /// Precipitation, mm/day
    pub rainfall: f64,
    /// All-sky surface shortwave irradiance, MJ/m²/day
    pub solar_radiation: f64,
    /// Wind speed at 2 m, m/s
    pub windspeed: f64,
}

impl WeatherSummary {
    /// True when every parameter produced a finite mean
    pub fn is_complete(&self) -> bool {
        [
            self.temperature,
            self.humidity,
            self.rainfall,
            self.solar_radiation,
            self.windspeed,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Summary shape produced by the AgroMonitoring provider
///
/// Carries soil moisture and temperature but no solar radiation or wind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgroWeatherSummary {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    /// Volumetric soil moisture, m³/m³
    pub soil_moisture: Option<f64>,
    /// Surface soil temperature, °C
    pub soil_temperature: Option<f64>,
}

impl From<AgroWeatherSummary> for WeatherSummary {
    fn from(agro: AgroWeatherSummary) -> Self {
        WeatherSummary {
            temperature: agro.temperature,
            humidity: agro.humidity,
            rainfall: agro.rainfall,
            solar_radiation: f64::NAN,
            windspeed: f64::NAN,
        }
    }
}

/// Replace the provider's missing-value marker with NaN
pub fn sentinel_to_nan(value: f64, fill_value: f64) -> f64 {
    if value == fill_value || !value.is_finite() {
        f64::NAN
    } else {
        value
    }
}

/// Arithmetic mean of the non-NaN values; NaN when there are none
pub fn nan_mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
