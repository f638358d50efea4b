//! Stub providers and in-memory models shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use crop_advisory::data::ReferenceDataset;
use crop_advisory::error::{AppError, AppResult};
use crop_advisory::external::{
    Geocoder, RainfallForecast, SoilPropertiesSource, WeatherSource, WeatherWindow,
};
use crop_advisory::ml::{ModelBundle, ModelInfo, ModelRegistry, Predictor, TrainedModel};
use crop_advisory::services::{AdvisoryService, AdvisorySettings, Providers};
use serde_json::{json, Value};
use shared::{Location, Task, WeatherSummary};

// ============================================================================
// Stub providers
// ============================================================================

pub const NAGPUR: Location = Location {
    latitude: 21.1458,
    longitude: 79.0882,
};

/// Resolves every query to the same point, or to nothing
pub struct StubGeocoder {
    pub location: Option<Location>,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, state: &str, district: &str, country: &str) -> AppResult<Location> {
        self.location.ok_or_else(|| {
            AppError::LocationNotFound(format!("{}, {}, {}", district, state, country))
        })
    }
}

pub struct StubWeather {
    pub summary: Option<WeatherSummary>,
}

#[async_trait]
impl WeatherSource for StubWeather {
    async fn summarize(
        &self,
        _location: Location,
        _window: WeatherWindow,
    ) -> AppResult<WeatherSummary> {
        self.summary
            .ok_or_else(|| AppError::WeatherServiceUnavailable("archive offline".into()))
    }
}

pub struct StubForecast {
    pub total: f64,
}

#[async_trait]
impl RainfallForecast for StubForecast {
    async fn next_days_rainfall(&self, _location: Location, _days: u32) -> AppResult<f64> {
        Ok(self.total)
    }
}

/// Soil service answering with fixed values; `None` fields fail the call
pub struct StubSoil {
    pub ph: Option<f64>,
    pub wrb: Option<String>,
}

impl StubSoil {
    pub fn unreachable() -> Self {
        Self { ph: None, wrb: None }
    }
}

#[async_trait]
impl SoilPropertiesSource for StubSoil {
    async fn ph(&self, _location: Location) -> AppResult<Option<f64>> {
        match self.ph {
            Some(ph) => Ok(Some(ph)),
            None => Err(AppError::UpstreamUnavailable("soil service timed out".into())),
        }
    }

    async fn wrb_class(&self, _location: Location) -> AppResult<Option<String>> {
        match &self.wrb {
            Some(class) => Ok(Some(class.clone())),
            None => Err(AppError::UpstreamUnavailable("soil service timed out".into())),
        }
    }
}

pub fn nagpur_weather() -> WeatherSummary {
    WeatherSummary {
        temperature: 27.5,
        humidity: 65.0,
        rainfall: 2.1,
        solar_radiation: 18.4,
        windspeed: 2.6,
    }
}

pub fn providers(soil: StubSoil) -> Providers {
    Providers {
        geocoder: Arc::new(StubGeocoder {
            location: Some(NAGPUR),
        }),
        weather: Arc::new(StubWeather {
            summary: Some(nagpur_weather()),
        }),
        forecast: Arc::new(StubForecast { total: 12.4 }),
        soil: Arc::new(soil),
    }
}

pub fn vertisol() -> StubSoil {
    StubSoil {
        ph: Some(6.8),
        wrb: Some("Vertisols".into()),
    }
}

// ============================================================================
// Reference data
// ============================================================================

pub fn reference() -> ReferenceDataset {
    let csv = "Soil_Type,Crop,pH,Nitrogen,Phosphorus,Potassium\n\
               Sandy,rice,5.5,80,40,40\n\
               Sandy,rice,6.5,100,50,30\n\
               Clay,wheat,7.8,120,60,40\n\
               Loamy,maize,6.9,90,45,35\n";
    ReferenceDataset::from_reader(csv.as_bytes()).expect("reference csv parses")
}

// ============================================================================
// Models
// ============================================================================

/// Splits on the encoded crop column: first class goes to Urea, others to DAP
pub fn fertilizer_bundle() -> Value {
    json!({
        "name": "fertilizer_forest",
        "features": ["N", "P", "K", "temperature", "humidity", "ph", "rainfall", "crop_encoded"],
        "preprocessor": {
            "crop_encoded": {"type": "categorical", "classes": ["maize", "rice", "wheat"]}
        },
        "target_classes": ["Urea", "DAP"],
        "estimator": {
            "type": "forest",
            "mode": "classification",
            "trees": [{"nodes": [
                {"split": {"feature": 7, "threshold": 0.5, "left": 1, "right": 2}},
                {"leaf": {"value": [1.0, 0.0]}},
                {"leaf": {"value": [0.0, 1.0]}}
            ]}]
        }
    })
}

/// Binary logistic model that prefers drip once the forecast passes 10 mm
pub fn irrigation_bundle() -> Value {
    json!({
        "name": "irrigation_logistic",
        "features": [
            "crop_name", "soil_type", "water_holding_capacity",
            "rainfall_forecast_next_7_days", "area_acres"
        ],
        "preprocessor": {
            "crop_name": {"type": "categorical", "classes": ["rice", "wheat"]},
            "soil_type": {"type": "categorical", "classes": ["clay", "loamy", "sandy"]},
            "water_holding_capacity": {"type": "categorical", "classes": ["high", "low", "medium"]}
        },
        "target_classes": ["drip", "sprinkler"],
        "estimator": {
            "type": "linear",
            "intercept": [10.0],
            "coefficients": [[0.0, 0.0, 0.0, -1.0, 0.0]]
        }
    })
}

/// Humid conditions raise the risk
pub fn pest_bundle() -> Value {
    json!({
        "name": "pest_forest",
        "features": [
            "Crop", "Variety", "Growth_Stage", "Soil_Type",
            "pH_Value", "Temperature", "Humidity", "Rainfall"
        ],
        "preprocessor": {
            "Crop": {"type": "categorical", "classes": ["Cotton", "Rice"]},
            "Variety": {"type": "categorical", "classes": ["Basmati", "Pusa"]},
            "Growth_Stage": {"type": "categorical", "classes": ["Flowering", "Vegetative"]},
            "Soil_Type": {"type": "categorical", "classes": ["Clay", "Loamy", "Sandy"]}
        },
        "target_classes": ["High", "Low", "Medium"],
        "estimator": {
            "type": "forest",
            "mode": "classification",
            "trees": [{"nodes": [
                {"split": {"feature": 6, "threshold": 70.0, "left": 1, "right": 2}},
                {"leaf": {"value": [0.1, 0.7, 0.2]}},
                {"leaf": {"value": [0.8, 0.0, 0.2]}}
            ]}]
        }
    })
}

/// Constant regressor, kg per acre
pub fn yield_bundle() -> Value {
    json!({
        "name": "Random Forest",
        "features": ["year", "temperature_c", "crop", "area_ha", "n_req_kg_per_ha", "ph"],
        "preprocessor": {
            "crop": {"type": "categorical", "classes": ["rice", "wheat"]}
        },
        "estimator": {
            "type": "linear",
            "intercept": [1234.567],
            "coefficients": [[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]]
        }
    })
}

pub fn trained(bundle: Value) -> TrainedModel {
    let bundle: ModelBundle = serde_json::from_value(bundle).expect("bundle deserializes");
    TrainedModel::from_bundle(bundle, "0".repeat(64)).expect("bundle is valid")
}

pub fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for (task, bundle) in [
        (Task::Fertilizer, fertilizer_bundle()),
        (Task::Irrigation, irrigation_bundle()),
        (Task::Pest, pest_bundle()),
        (Task::Yield, yield_bundle()),
    ] {
        let model = trained(bundle);
        let info = ModelInfo {
            task,
            name: model.name().to_string(),
            path: format!("memory://{}", task),
            sha256: model.digest().to_string(),
        };
        registry.insert(task, Arc::new(model), info);
    }
    registry
}

pub fn service_with(providers: Providers, reference: ReferenceDataset) -> AdvisoryService {
    AdvisoryService::new(
        providers,
        Arc::new(reference),
        Arc::new(registry()),
        AdvisorySettings::default(),
    )
}

pub fn service() -> AdvisoryService {
    service_with(providers(vertisol()), reference())
}
