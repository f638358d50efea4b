//! Weather aggregation over the trailing archive window

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use shared::{Location, WeatherSummary};

use crate::error::AppResult;
use crate::external::{WeatherSource, WeatherWindow};

/// Summarizes recent weather for a location
#[derive(Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    window_days: u32,
    latency_days: u32,
}

impl WeatherService {
    /// Create a new WeatherService instance
    pub fn new(source: Arc<dyn WeatherSource>, window_days: u32, latency_days: u32) -> Self {
        Self {
            source,
            window_days,
            latency_days,
        }
    }

    /// Mean conditions over the window ending `latency_days` before today
    pub async fn summarize(&self, location: Location) -> AppResult<WeatherSummary> {
        self.summarize_as_of(location, Utc::now().date_naive()).await
    }

    pub async fn summarize_as_of(
        &self,
        location: Location,
        today: NaiveDate,
    ) -> AppResult<WeatherSummary> {
        let window = WeatherWindow::ending_before(today, self.latency_days, self.window_days);
        let summary = self.source.summarize(location, window).await?;

        if !summary.is_complete() {
            tracing::warn!(
                start = %window.start,
                end = %window.end,
                "Weather summary has parameters without any valid readings"
            );
        }
        tracing::debug!(
            temperature = summary.temperature,
            humidity = summary.humidity,
            rainfall = summary.rainfall,
            "Weather summarized"
        );
        Ok(summary)
    }
}
