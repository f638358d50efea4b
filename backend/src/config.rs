//! Configuration management for the Crop Advisory Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with AGRI prefix (e.g. AGRI__SERVER__PORT)
//!
//! `AGRI_ENVIRONMENT` (single underscore) selects the config file.

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    /// Shared outbound HTTP client settings
    pub http: HttpConfig,

    pub geocoding: GeocodingConfig,

    pub weather: WeatherConfig,

    /// Rainfall forecast provider
    pub forecast: ForecastConfig,

    pub soil: SoilConfig,

    pub data: DataConfig,

    /// Model artifact locations
    pub models: ModelsConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout for every outbound call
    pub timeout_secs: u64,

    /// Nominatim rejects requests without an identifying agent
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,

    /// Country appended to every free-text query
    pub country: String,
}

/// Which historical weather provider backs the aggregator
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherProvider {
    NasaPower,
    Agromonitoring,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    pub provider: WeatherProvider,

    /// NASA POWER base URL
    pub base_url: String,

    /// Days averaged into the summary
    pub window_days: u32,

    /// Days the archive lags behind today
    pub latency_days: u32,

    pub agromonitoring_base_url: String,

    pub agromonitoring_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    pub base_url: String,
    pub days: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SoilConfig {
    pub base_url: String,

    /// SoilGrids depth interval, e.g. "0-5cm"
    pub depth: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// CSV used for soil fallback and NPK derivation
    pub reference_dataset: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    pub fertilizer: PathBuf,
    pub irrigation: PathBuf,
    pub pest: PathBuf,

    /// Directory holding the candidate yield bundles
    pub yield_dir: PathBuf,

    /// Results table inside `yield_dir` used to pick the best yield model
    pub yield_results: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("http.timeout_secs", 10)?
            .set_default("http.user_agent", "crop-advisory/0.1")?
            .set_default("geocoding.base_url", "https://nominatim.openstreetmap.org")?
            .set_default("geocoding.country", "India")?
            .set_default("weather.provider", "nasa_power")?
            .set_default("weather.base_url", "https://power.larc.nasa.gov")?
            .set_default("weather.window_days", 7)?
            .set_default("weather.latency_days", 2)?
            .set_default(
                "weather.agromonitoring_base_url",
                "https://api.agromonitoring.com/agro/1.0",
            )?
            .set_default("forecast.base_url", "https://api.open-meteo.com")?
            .set_default("forecast.days", 7)?
            .set_default("soil.base_url", "https://rest.isric.org/soilgrids/v2.0")?
            .set_default("soil.depth", "0-5cm")?
            .set_default("data.reference_dataset", "data/reference.csv")?
            .set_default("models.fertilizer", "models/fertilizer.json")?
            .set_default("models.irrigation", "models/irrigation.json")?
            .set_default("models.pest", "models/pest.json")?
            .set_default("models.yield_dir", "models/yield")?
            .set_default("models.yield_results", "results.csv")?
            .set_default("logging.json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRI__ prefix)
            .add_source(env_overrides())
            .build()?;

        config.try_deserialize()
    }
}

/// `AGRI__SECTION__KEY` variables; the prefix takes the same `__` separator
fn env_overrides() -> Environment {
    Environment::with_prefix("AGRI")
        .separator("__")
        .try_parsing(true)
}
