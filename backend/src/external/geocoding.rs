//! Nominatim geocoding client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{validate_coordinates, Location};

use super::{fetch_json, Geocoder};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://nominatim.openstreetmap.org".to_string())
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn resolve(&self, state: &str, district: &str, country: &str) -> AppResult<Location> {
        let query = format!("{}, {}, {}", district, state, country);
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")]);

        let places: Vec<NominatimPlace> = fetch_json(request, "Geocoding")
            .await
            .map_err(AppError::UpstreamUnavailable)?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LocationNotFound(query.clone()))?;

        let location = parse_place(&place).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Geocoding returned bad coordinates: {}", e))
        })?;

        tracing::debug!(
            query = %query,
            latitude = location.latitude,
            longitude = location.longitude,
            "Geocoded location"
        );
        Ok(location)
    }
}

fn parse_place(place: &NominatimPlace) -> Result<Location, String> {
    let latitude: f64 = place
        .lat
        .trim()
        .parse()
        .map_err(|_| format!("latitude '{}'", place.lat))?;
    let longitude: f64 = place
        .lon
        .trim()
        .parse()
        .map_err(|_| format!("longitude '{}'", place.lon))?;
    validate_coordinates(latitude, longitude)?;
    Ok(Location::new(latitude, longitude))
}
