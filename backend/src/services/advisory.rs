//! Advisory pipeline
//!
//! geocode -> (weather, soil, forecast) -> assemble -> predict -> advise

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use shared::{
    advise, fertilizer_full_name, round_to, AdvisoryContext, FarmInputs, FeatureVector, Location,
    NpkEstimate, PredictionValue, SoilProfile, SoilType, Task, WaterHoldingCapacity,
    WeatherSummary,
};
use tracing::Instrument;
use uuid::Uuid;

use super::features::{self, AssemblyContext};
use super::soil::SoilResolver;
use super::weather::WeatherService;
use crate::config::{Config, WeatherProvider};
use crate::data::ReferenceDataset;
use crate::error::{AppError, AppResult};
use crate::external::{
    http_client, AgroMonitoringClient, Geocoder, NasaPowerClient, NominatimClient,
    OpenMeteoClient, RainfallForecast, SoilGridsClient, SoilPropertiesSource, WeatherSource,
};
use crate::ml::{ModelRegistry, Predictor};

/// External data providers the pipeline fans out to
#[derive(Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherSource>,
    pub forecast: Arc<dyn RainfallForecast>,
    pub soil: Arc<dyn SoilPropertiesSource>,
}

#[derive(Debug, Clone)]
pub struct AdvisorySettings {
    /// Used when the request names no country
    pub country: String,
    pub window_days: u32,
    pub latency_days: u32,
    pub forecast_days: u32,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            country: "India".to_string(),
            window_days: 7,
            latency_days: 2,
            forecast_days: 7,
        }
    }
}

/// Response body of every `/<task>/predict` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub task: Task,
    pub prediction: PredictionValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_proba: Option<BTreeMap<String, f64>>,
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fertilizer_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_holding_capacity: Option<WaterHoldingCapacity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_forecast_next_7_days: Option<f64>,
    /// Yield over the whole field, kg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_prediction: Option<f64>,

    pub state: String,
    pub district: String,
    pub location: Location,
    pub weather: WeatherSummary,
    pub soil: SoilProfile,
    pub inputs_used: FeatureVector,
}

/// Runs a full advisory request for any task
pub struct AdvisoryService {
    geocoder: Arc<dyn Geocoder>,
    weather: WeatherService,
    forecast: Arc<dyn RainfallForecast>,
    soil: SoilResolver,
    reference: Arc<ReferenceDataset>,
    models: Arc<ModelRegistry>,
    settings: AdvisorySettings,
}

impl AdvisoryService {
    pub fn new(
        providers: Providers,
        reference: Arc<ReferenceDataset>,
        models: Arc<ModelRegistry>,
        settings: AdvisorySettings,
    ) -> Self {
        Self {
            geocoder: providers.geocoder,
            weather: WeatherService::new(
                providers.weather,
                settings.window_days,
                settings.latency_days,
            ),
            forecast: providers.forecast,
            soil: SoilResolver::new(providers.soil, reference.clone()),
            reference,
            models,
            settings,
        }
    }

    /// Wire real providers, reference data and models from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = http_client(&config.http)?;

        let weather: Arc<dyn WeatherSource> = match config.weather.provider {
            WeatherProvider::NasaPower => Arc::new(NasaPowerClient::with_base_url(
                client.clone(),
                config.weather.base_url.clone(),
            )),
            WeatherProvider::Agromonitoring => {
                let api_key = config.weather.agromonitoring_api_key.clone().ok_or_else(|| {
                    AppError::Configuration(
                        "weather.agromonitoring_api_key is required for the agromonitoring provider"
                            .to_string(),
                    )
                })?;
                Arc::new(AgroMonitoringClient::with_base_url(
                    client.clone(),
                    api_key,
                    config.weather.agromonitoring_base_url.clone(),
                ))
            }
        };

        let providers = Providers {
            geocoder: Arc::new(NominatimClient::with_base_url(
                client.clone(),
                config.geocoding.base_url.clone(),
            )),
            weather,
            forecast: Arc::new(OpenMeteoClient::with_base_url(
                client.clone(),
                config.forecast.base_url.clone(),
            )),
            soil: Arc::new(SoilGridsClient::with_base_url(
                client,
                config.soil.base_url.clone(),
                config.soil.depth.clone(),
            )),
        };

        let reference = match &config.data.reference_dataset {
            Some(path) => match ReferenceDataset::load(path) {
                Ok(data) => {
                    tracing::info!(
                        path = %path.display(),
                        rows = data.len(),
                        "Loaded reference dataset"
                    );
                    data
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Reference dataset unavailable"
                    );
                    ReferenceDataset::empty()
                }
            },
            None => ReferenceDataset::empty(),
        };

        let models = ModelRegistry::load(&config.models)?;

        Ok(Self::new(
            providers,
            Arc::new(reference),
            Arc::new(models),
            AdvisorySettings {
                country: config.geocoding.country.clone(),
                window_days: config.weather.window_days,
                latency_days: config.weather.latency_days,
                forecast_days: config.forecast.days,
            },
        ))
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    fn predictor(&self, task: Task) -> AppResult<Arc<dyn Predictor>> {
        self.models
            .get(task)
            .ok_or_else(|| AppError::Configuration(format!("no model loaded for {}", task)))
    }

    /// Declared input features of a task's model
    pub fn feature_names(&self, task: Task) -> AppResult<Vec<String>> {
        Ok(self.predictor(task)?.schema().features.clone())
    }

    /// Produce a recommendation for `task` from the caller's farm inputs
    pub async fn run(&self, task: Task, inputs: &FarmInputs) -> AppResult<Advisory> {
        let span = tracing::info_span!("advisory", request_id = %Uuid::new_v4(), task = %task);
        self.run_inner(task, inputs).instrument(span).await
    }

    async fn run_inner(&self, task: Task, inputs: &FarmInputs) -> AppResult<Advisory> {
        let predictor = self.predictor(task)?;

        let state = required(&inputs.state, "state")?;
        let district = required(&inputs.district, "district")?;
        let crop = required(&inputs.crop, "crop")?;
        let country = FarmInputs::text(&inputs.country).unwrap_or(&self.settings.country);
        let hint = FarmInputs::text(&inputs.soil_type)
            .map(SoilType::parse)
            .filter(SoilType::is_known);

        let location = self.geocoder.resolve(state, district, country).await?;

        let forecast = async {
            if task == Task::Irrigation {
                self.forecast
                    .next_days_rainfall(location, self.settings.forecast_days)
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        };
        let (weather, soil, forecast) = tokio::join!(
            self.weather.summarize(location),
            self.soil.resolve(location, Some(crop), hint),
            forecast
        );
        let weather = weather?;
        let rainfall_forecast = forecast?;

        let reference_npk = match task {
            Task::Fertilizer | Task::Yield => self
                .reference
                .npk_estimate(Some(hint.unwrap_or(soil.soil_type)), crop),
            Task::Irrigation | Task::Pest => None,
        };

        let ctx = AssemblyContext {
            inputs,
            weather: &weather,
            soil: &soil,
            rainfall_forecast,
            reference_npk,
            year: Utc::now().year(),
        };
        let schema = predictor.schema();
        let features = features::assemble(task, &ctx, schema)?;
        let row = features::encode(&features, schema)?;
        let prediction = predictor.predict(&row)?;

        // totals scale the raw output; only the reported values are rounded
        let total_prediction = match (task, &prediction.value, inputs.area_acres) {
            (Task::Yield, PredictionValue::Value(raw), Some(area)) => {
                Some(round_to(raw * area, 2))
            }
            _ => None,
        };
        let value = match &prediction.value {
            PredictionValue::Value(v) => PredictionValue::Value(round_to(*v, 2)),
            label => label.clone(),
        };

        let advice_ctx = AdvisoryContext {
            crop,
            growth_stage: FarmInputs::text(&inputs.growth_stage),
            weather: &weather,
            soil: &soil,
            rainfall_forecast,
            area_acres: inputs.area_acres,
            npk: effective_npk(inputs, reference_npk),
        };
        let suggestion = advise(task, &prediction.value, &advice_ctx);

        tracing::info!(
            prediction = %value,
            soil_source = ?soil.source,
            "Advisory produced"
        );

        Ok(Advisory {
            task,
            prediction_proba: prediction.rounded_probabilities(),
            suggestion,
            fertilizer_full: match (task, &value) {
                (Task::Fertilizer, PredictionValue::Label(code)) => {
                    Some(fertilizer_full_name(code))
                }
                _ => None,
            },
            water_holding_capacity: (task == Task::Irrigation)
                .then(|| soil.soil_type.or_loamy().water_holding_capacity()),
            rainfall_forecast_next_7_days: rainfall_forecast,
            total_prediction,
            prediction: value,
            state: state.to_string(),
            district: district.to_string(),
            location,
            weather,
            soil,
            inputs_used: features,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> AppResult<&'a str> {
    FarmInputs::text(value).ok_or_else(|| AppError::MissingField(field.to_string()))
}

/// Caller's nutrient readings, with reference means filling any gaps
fn effective_npk(inputs: &FarmInputs, reference: Option<NpkEstimate>) -> Option<NpkEstimate> {
    match (inputs.nitrogen, inputs.phosphorus, inputs.potassium, reference) {
        (Some(n), Some(p), Some(k), _) => Some(NpkEstimate {
            nitrogen: n,
            phosphorus: p,
            potassium: k,
        }),
        (n, p, k, Some(r)) => Some(NpkEstimate {
            nitrogen: n.unwrap_or(r.nitrogen),
            phosphorus: p.unwrap_or(r.phosphorus),
            potassium: k.unwrap_or(r.potassium),
        }),
        _ => None,
    }
}
