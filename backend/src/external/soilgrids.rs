//! ISRIC SoilGrids REST client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{validate_ph, Location};

use super::{fetch_json, SoilPropertiesSource};
use crate::error::{AppError, AppResult};

/// SoilGrids stores pH(H2O) multiplied by ten
const PH_SCALE: f64 = 10.0;

#[derive(Clone)]
pub struct SoilGridsClient {
    client: Client,
    base_url: String,
    depth: String,
}

#[derive(Debug, Deserialize)]
struct PropertiesResponse {
    properties: Layers,
}

#[derive(Debug, Deserialize)]
struct Layers {
    layers: Vec<Layer>,
}

#[derive(Debug, Deserialize)]
struct Layer {
    name: String,
    depths: Vec<Depth>,
}

#[derive(Debug, Deserialize)]
struct Depth {
    label: String,
    values: DepthValues,
}

#[derive(Debug, Deserialize)]
struct DepthValues {
    mean: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    wrb_class_name: Option<String>,
}

impl SoilGridsClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(
            client,
            "https://rest.isric.org/soilgrids/v2.0".to_string(),
            "0-5cm".to_string(),
        )
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(client: Client, base_url: String, depth: String) -> Self {
        Self {
            client,
            base_url,
            depth,
        }
    }
}

#[async_trait]
impl SoilPropertiesSource for SoilGridsClient {
    async fn ph(&self, location: Location) -> AppResult<Option<f64>> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let request = self
            .client
            .get(format!("{}/properties/query", self.base_url))
            .query(&[
                ("lon", longitude.as_str()),
                ("lat", latitude.as_str()),
                ("property", "phh2o"),
                ("depth", self.depth.as_str()),
                ("value", "mean"),
            ]);

        let data: PropertiesResponse = fetch_json(request, "SoilGrids properties")
            .await
            .map_err(AppError::UpstreamUnavailable)?;
        Ok(extract_ph(&data, &self.depth))
    }

    async fn wrb_class(&self, location: Location) -> AppResult<Option<String>> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let request = self
            .client
            .get(format!("{}/classification/query", self.base_url))
            .query(&[
                ("lon", longitude.as_str()),
                ("lat", latitude.as_str()),
                ("number_classes", "1"),
            ]);

        let data: ClassificationResponse = fetch_json(request, "SoilGrids classification")
            .await
            .map_err(AppError::UpstreamUnavailable)?;
        Ok(data.wrb_class_name.filter(|c| !c.trim().is_empty()))
    }
}

fn extract_ph(data: &PropertiesResponse, depth: &str) -> Option<f64> {
    data.properties
        .layers
        .iter()
        .find(|l| l.name == "phh2o")
        .and_then(|l| l.depths.iter().find(|d| d.label == depth))
        .and_then(|d| d.values.mean)
        .map(|raw| raw / PH_SCALE)
        .filter(|ph| validate_ph(*ph).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_scaled_ph() {
        let data: PropertiesResponse = serde_json::from_value(json!({
            "type": "Feature",
            "properties": {"layers": [{
                "name": "phh2o",
                "unit_measure": {"d_factor": 10},
                "depths": [
                    {"label": "0-5cm", "range": {}, "values": {"mean": 68}},
                    {"label": "5-15cm", "range": {}, "values": {"mean": 70}}
                ]
            }]}
        }))
        .unwrap();
        assert_eq!(extract_ph(&data, "0-5cm"), Some(6.8));
        assert_eq!(extract_ph(&data, "5-15cm"), Some(7.0));
        assert_eq!(extract_ph(&data, "30-60cm"), None);
    }

    #[test]
    fn test_null_mean_is_absent() {
        let data: PropertiesResponse = serde_json::from_value(json!({
            "properties": {"layers": [{
                "name": "phh2o",
                "depths": [{"label": "0-5cm", "values": {"mean": null}}]
            }]}
        }))
        .unwrap();
        assert_eq!(extract_ph(&data, "0-5cm"), None);
    }

    #[test]
    fn test_out_of_range_ph_is_absent() {
        let data: PropertiesResponse = serde_json::from_value(json!({
            "properties": {"layers": [{
                "name": "phh2o",
                "depths": [{"label": "0-5cm", "values": {"mean": 327}}]
            }]}
        }))
        .unwrap();
        assert_eq!(extract_ph(&data, "0-5cm"), None);
    }

    #[test]
    fn test_classification_null_name() {
        let data: ClassificationResponse =
            serde_json::from_value(json!({"wrb_class_name": null, "wrb_class_value": null})).unwrap();
        assert!(data.wrb_class_name.is_none());
    }
}
