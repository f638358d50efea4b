//! Feature assembly and encoding
//!
//! Each task has a declarative descriptor listing every feature name it can
//! serve and where that value comes from. The loaded model's declared feature
//! list decides which of them are produced, and in what order.

use shared::{
    acres_to_hectares, lower_case, title_case, FarmInputs, FeatureValue, FeatureVector,
    NpkEstimate, SoilProfile, SoilType, Task, WeatherSummary,
};
use thiserror::Error;

use crate::ml::{FeatureEncoder, ModelSchema};

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("{task} model expects feature '{feature}', which this task cannot supply")]
    SchemaMismatch { task: String, feature: String },

    #[error("required field '{0}' is missing")]
    MissingField(String),

    #[error("feature '{0}' has no usable value")]
    NonFinite(String),

    /// The weather archive returned no valid readings for this parameter
    #[error("weather parameter for feature '{0}' has no valid readings")]
    WeatherUnavailable(String),
}

// ============================================================================
// Descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Crop,
    Variety,
    GrowthStage,
    State,
    District,
    WaterAvailability,
    SourceOfWater,
    FieldSlope,
}

impl UserField {
    fn name(&self) -> &'static str {
        match self {
            UserField::Crop => "crop",
            UserField::Variety => "variety",
            UserField::GrowthStage => "growth_stage",
            UserField::State => "state",
            UserField::District => "district",
            UserField::WaterAvailability => "water_availability",
            UserField::SourceOfWater => "source_of_water",
            UserField::FieldSlope => "field_slope",
        }
    }

    fn value<'a>(&self, inputs: &'a FarmInputs) -> Option<&'a str> {
        FarmInputs::text(match self {
            UserField::Crop => &inputs.crop,
            UserField::Variety => &inputs.variety,
            UserField::GrowthStage => &inputs.growth_stage,
            UserField::State => &inputs.state,
            UserField::District => &inputs.district,
            UserField::WaterAvailability => &inputs.water_availability,
            UserField::SourceOfWater => &inputs.source_of_water,
            UserField::FieldSlope => &inputs.field_slope,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherParam {
    Temperature,
    Humidity,
    Rainfall,
    SolarRadiation,
    WindSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    fn of(&self, npk: &NpkEstimate) -> f64 {
        match self {
            Nutrient::Nitrogen => npk.nitrogen,
            Nutrient::Phosphorus => npk.phosphorus,
            Nutrient::Potassium => npk.potassium,
        }
    }

    fn user_value(&self, inputs: &FarmInputs) -> Option<f64> {
        match self {
            Nutrient::Nitrogen => inputs.nitrogen,
            Nutrient::Phosphorus => inputs.phosphorus,
            Nutrient::Potassium => inputs.potassium,
        }
    }
}

/// Where a feature's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    /// Free text from the request. Optional fields left blank encode as the
    /// encoder's substitute class.
    User { field: UserField, required: bool },
    /// Resolved soil type, Unknown read as Loamy
    ResolvedSoil,
    /// Caller's soil type verbatim, else the resolved one
    PreferredSoil,
    WaterHoldingCapacity,
    SoilPh,
    Weather(WeatherParam),
    RainfallForecast,
    /// Defaults to zero
    AreaAcres,
    AreaHectares,
    /// Caller's measurement when `user_first`, else the reference mean
    Npk { nutrient: Nutrient, user_first: bool },
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Keep,
    Title,
    Lower,
    /// Drop the fractional part; numeric only
    Truncate,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub source: FeatureSource,
    pub normalize: Normalize,
}

const fn spec(name: &'static str, source: FeatureSource, normalize: Normalize) -> FeatureSpec {
    FeatureSpec {
        name,
        source,
        normalize,
    }
}

const fn user(field: UserField, required: bool) -> FeatureSource {
    FeatureSource::User { field, required }
}

const fn nutrient(nutrient: Nutrient, user_first: bool) -> FeatureSource {
    FeatureSource::Npk {
        nutrient,
        user_first,
    }
}

use FeatureSource::{Weather as W, *};
use Normalize::*;
use WeatherParam::*;

const FERTILIZER: &[FeatureSpec] = &[
    spec("N", nutrient(Nutrient::Nitrogen, true), Keep),
    spec("P", nutrient(Nutrient::Phosphorus, true), Keep),
    spec("K", nutrient(Nutrient::Potassium, true), Keep),
    spec("temperature", W(Temperature), Truncate),
    spec("humidity", W(Humidity), Truncate),
    spec("ph", SoilPh, Truncate),
    spec("rainfall", W(Rainfall), Truncate),
    spec("crop_encoded", user(UserField::Crop, true), Keep),
];

const IRRIGATION: &[FeatureSpec] = &[
    spec("crop_name", user(UserField::Crop, true), Keep),
    spec("growth_stage", user(UserField::GrowthStage, false), Lower),
    spec("soil_type", PreferredSoil, Lower),
    spec("soil_ph", SoilPh, Keep),
    spec("water_holding_capacity", WaterHoldingCapacity, Keep),
    spec("temperature", W(Temperature), Keep),
    spec("humidity", W(Humidity), Keep),
    spec("rainfall_last_7_days", W(Rainfall), Keep),
    spec("rainfall_forecast_next_7_days", RainfallForecast, Keep),
    spec("water_availability", user(UserField::WaterAvailability, false), Keep),
    spec("source_of_water", user(UserField::SourceOfWater, false), Keep),
    spec("field_slope", user(UserField::FieldSlope, false), Keep),
    spec("area_acres", AreaAcres, Keep),
];

const PEST: &[FeatureSpec] = &[
    spec("Crop", user(UserField::Crop, true), Title),
    spec("Variety", user(UserField::Variety, true), Title),
    spec("Growth_Stage", user(UserField::GrowthStage, true), Keep),
    spec("Soil_Type", ResolvedSoil, Keep),
    spec("pH_Value", SoilPh, Keep),
    spec("Temperature", W(Temperature), Keep),
    spec("Humidity", W(Humidity), Keep),
    spec("Rainfall", W(Rainfall), Keep),
];

const YIELD: &[FeatureSpec] = &[
    spec("year", Year, Keep),
    spec("temperature_c", W(Temperature), Truncate),
    spec("humidity_%", W(Humidity), Keep),
    spec("rainfall_mm", W(Rainfall), Keep),
    spec("wind_speed_m_s", W(WindSpeed), Keep),
    spec("solar_radiation_mj_m2_day", W(SolarRadiation), Keep),
    spec("crop", user(UserField::Crop, true), Keep),
    spec("state_name", user(UserField::State, true), Keep),
    spec("dist_name", user(UserField::District, true), Keep),
    spec("n_req_kg_per_ha", nutrient(Nutrient::Nitrogen, false), Truncate),
    spec("p_req_kg_per_ha", nutrient(Nutrient::Phosphorus, false), Truncate),
    spec("k_req_kg_per_ha", nutrient(Nutrient::Potassium, false), Truncate),
    spec("area_ha", AreaHectares, Truncate),
    spec("ph", SoilPh, Keep),
];

/// Every feature a task knows how to produce
pub fn descriptor(task: Task) -> &'static [FeatureSpec] {
    match task {
        Task::Fertilizer => FERTILIZER,
        Task::Irrigation => IRRIGATION,
        Task::Pest => PEST,
        Task::Yield => YIELD,
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Everything a feature may be derived from
#[derive(Debug, Clone)]
pub struct AssemblyContext<'a> {
    pub inputs: &'a FarmInputs,
    pub weather: &'a WeatherSummary,
    pub soil: &'a SoilProfile,
    pub rainfall_forecast: Option<f64>,
    /// Reference-dataset N/P/K means for the soil and crop
    pub reference_npk: Option<NpkEstimate>,
    pub year: i32,
}

impl AssemblyContext<'_> {
    /// Caller's parseable soil type, if any
    pub fn soil_hint(&self) -> Option<SoilType> {
        FarmInputs::text(&self.inputs.soil_type)
            .map(SoilType::parse)
            .filter(SoilType::is_known)
    }
}

/// Build the feature vector in the model's declared order
pub fn assemble(
    task: Task,
    ctx: &AssemblyContext<'_>,
    schema: &ModelSchema,
) -> Result<FeatureVector, AssemblyError> {
    let specs = descriptor(task);
    let mut vector = FeatureVector::with_capacity(schema.features.len());

    for name in &schema.features {
        let spec = specs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AssemblyError::SchemaMismatch {
                task: task.to_string(),
                feature: name.clone(),
            })?;
        vector.push(name.clone(), resolve(spec, ctx)?);
    }
    Ok(vector)
}

fn resolve(spec: &FeatureSpec, ctx: &AssemblyContext<'_>) -> Result<FeatureValue, AssemblyError> {
    let number = |value: Option<f64>| -> Result<FeatureValue, AssemblyError> {
        match value {
            Some(v) if v.is_finite() => Ok(FeatureValue::Number(match spec.normalize {
                Truncate => v.trunc(),
                _ => v,
            })),
            _ => Err(AssemblyError::NonFinite(spec.name.to_string())),
        }
    };
    let category = |value: &str| -> FeatureValue {
        FeatureValue::Category(match spec.normalize {
            Title => title_case(value),
            Lower => lower_case(value),
            _ => value.trim().to_string(),
        })
    };

    match spec.source {
        User { field, required } => match field.value(ctx.inputs) {
            Some(value) => Ok(category(value)),
            None if required => Err(AssemblyError::MissingField(field.name().to_string())),
            None => Ok(category("")),
        },
        ResolvedSoil => Ok(category(ctx.soil.soil_type.or_loamy().as_str())),
        PreferredSoil => Ok(match FarmInputs::text(&ctx.inputs.soil_type) {
            Some(soil) => category(soil),
            None => category(ctx.soil.soil_type.or_loamy().as_str()),
        }),
        WaterHoldingCapacity => Ok(category(
            ctx.soil.soil_type.or_loamy().water_holding_capacity().as_str(),
        )),
        SoilPh => number(Some(ctx.soil.ph)),
        W(param) => {
            let value = match param {
                Temperature => ctx.weather.temperature,
                Humidity => ctx.weather.humidity,
                Rainfall => ctx.weather.rainfall,
                SolarRadiation => ctx.weather.solar_radiation,
                WindSpeed => ctx.weather.windspeed,
            };
            if !value.is_finite() {
                return Err(AssemblyError::WeatherUnavailable(spec.name.to_string()));
            }
            number(Some(value))
        }
        RainfallForecast => number(ctx.rainfall_forecast),
        AreaAcres => number(Some(ctx.inputs.area_acres.unwrap_or(0.0))),
        AreaHectares => match ctx.inputs.area_acres {
            Some(acres) => number(Some(acres_to_hectares(acres))),
            None => Err(AssemblyError::MissingField("area_acres".to_string())),
        },
        Npk {
            nutrient,
            user_first,
        } => {
            let user_value = if user_first {
                nutrient.user_value(ctx.inputs)
            } else {
                None
            };
            match user_value.or_else(|| ctx.reference_npk.as_ref().map(|npk| nutrient.of(npk))) {
                Some(v) => number(Some(v)),
                None => Err(AssemblyError::MissingField(spec.name.to_string())),
            }
        }
        Year => number(Some(f64::from(ctx.year))),
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode an assembled vector into the numeric row the model consumes.
///
/// Categories unseen at training time take the encoder's substitute class.
pub fn encode(vector: &FeatureVector, schema: &ModelSchema) -> Result<Vec<f64>, AssemblyError> {
    let mut row = Vec::with_capacity(schema.input_width());

    for ((name, value), encoder) in vector.iter().zip(&schema.encoders) {
        match (value, encoder) {
            (FeatureValue::Category(c), FeatureEncoder::Categorical { .. }) => {
                push_category(name, c, encoder, &mut row)
            }
            (FeatureValue::Number(n), FeatureEncoder::Categorical { .. }) => {
                push_category(name, &format_number(*n), encoder, &mut row)
            }
            (FeatureValue::Number(n), FeatureEncoder::Numeric { .. }) => {
                row.push(encoder.scale_number(*n))
            }
            (FeatureValue::Category(c), FeatureEncoder::Numeric { .. }) => {
                let n: f64 = c
                    .parse()
                    .map_err(|_| AssemblyError::NonFinite(name.to_string()))?;
                row.push(encoder.scale_number(n));
            }
        }
    }
    Ok(row)
}

fn push_category(name: &str, value: &str, encoder: &FeatureEncoder, row: &mut Vec<f64>) {
    if encoder.push_category(value, row) {
        tracing::debug!(feature = name, value, "Unseen category; substituting fallback class");
    }
}

/// Integral values print without a trailing ".0", matching label encoders fit on ints
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
