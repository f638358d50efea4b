//! Advisory text generation
//!
//! Turns a prediction plus its agronomic context into farmer-facing guidance.
//! Everything here is a pure function of its arguments.

use crate::models::{NpkEstimate, NutrientLevel, PredictionValue, SoilProfile, WeatherSummary};
use crate::types::Task;

/// Returned for any prediction the rule tables do not cover
pub const UNINTERPRETABLE_ADVICE: &str = "The prediction could not be interpreted clearly. \
Please cross-check your inputs or consult your local agricultural officer.";

/// Numeric and categorical context the advice may reference
#[derive(Debug, Clone)]
pub struct AdvisoryContext<'a> {
    pub crop: &'a str,
    pub growth_stage: Option<&'a str>,
    pub weather: &'a WeatherSummary,
    pub soil: &'a SoilProfile,
    /// Forecast rainfall for the coming week, mm
    pub rainfall_forecast: Option<f64>,
    pub area_acres: Option<f64>,
    /// Nutrient levels that went into the prediction
    pub npk: Option<NpkEstimate>,
}

/// Produce the suggestion text for a task's prediction
pub fn advise(task: Task, prediction: &PredictionValue, ctx: &AdvisoryContext<'_>) -> String {
    match (task, prediction) {
        (Task::Fertilizer, PredictionValue::Label(name)) => fertilizer_advice(name, ctx),
        (Task::Irrigation, PredictionValue::Label(method)) => irrigation_advice(method, ctx),
        (Task::Pest, PredictionValue::Label(risk)) => pest_advice(risk, ctx),
        (Task::Yield, PredictionValue::Value(kg_per_acre)) => yield_advice(*kg_per_acre, ctx),
        _ => UNINTERPRETABLE_ADVICE.to_string(),
    }
}

// ============================================================================
// Fertilizer
// ============================================================================

const FERTILIZER_NAMES: [(&str, &str); 6] = [
    ("Urea", "Urea (Nitrogen-rich fertilizer)"),
    ("DAP", "Diammonium Phosphate (Phosphorus-based fertilizer)"),
    ("MOP", "Muriate of Potash (Potassium-based fertilizer)"),
    ("SSP", "Single Super Phosphate (Sulphur & Phosphorus)"),
    ("Ammonium Sulphate", "Ammonium Sulphate (Nitrogen & Sulphur)"),
    ("Compost", "Organic Compost (Improves soil health)"),
];

/// Expanded display name of a fertilizer code; unknown codes pass through
pub fn fertilizer_full_name(code: &str) -> String {
    FERTILIZER_NAMES
        .iter()
        .find(|(short, _)| *short == code)
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| code.to_string())
}

fn fertilizer_advice(code: &str, ctx: &AdvisoryContext<'_>) -> String {
    if code.trim().is_empty() {
        return UNINTERPRETABLE_ADVICE.to_string();
    }

    let mut parts = vec![format!(
        "For your {} crop, the recommended fertilizer is {}. Using this will help balance \
         your soil nutrients and improve your yield.",
        ctx.crop,
        fertilizer_full_name(code)
    )];

    if let Some(npk) = ctx.npk {
        let notes = [
            nutrient_note(
                npk.nitrogen,
                "Your Nitrogen level is low, so this fertilizer will help improve leaf growth.",
                "Nitrogen is already high, so apply cautiously to avoid over-fertilization.",
            ),
            nutrient_note(
                npk.phosphorus,
                "Phosphorus is low, which can affect root development. This recommendation helps balance it.",
                "Phosphorus is on the higher side, so avoid extra P-based fertilizers.",
            ),
            nutrient_note(
                npk.potassium,
                "Potassium is low, which may reduce crop quality. This fertilizer supports fruit/seed formation.",
                "Potassium is already sufficient, so apply in moderation.",
            ),
        ];
        parts.extend(notes.into_iter().flatten().map(String::from));
    }

    parts.join(" ")
}

fn nutrient_note(value: f64, low: &'static str, high: &'static str) -> Option<&'static str> {
    match NutrientLevel::classify(value) {
        NutrientLevel::Low => Some(low),
        NutrientLevel::High => Some(high),
        NutrientLevel::Adequate => None,
    }
}

// ============================================================================
// Irrigation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IrrigationMethod {
    RainFed,
    Drip,
    Sprinkler,
    Furrow,
}

impl IrrigationMethod {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "rain-fed" | "rainfed" => Some(IrrigationMethod::RainFed),
            "drip" => Some(IrrigationMethod::Drip),
            "sprinkler" => Some(IrrigationMethod::Sprinkler),
            "furrow" => Some(IrrigationMethod::Furrow),
            _ => None,
        }
    }
}

fn irrigation_advice(method: &str, ctx: &AdvisoryContext<'_>) -> String {
    let soil = ctx.soil.soil_type;
    let capacity = soil.water_holding_capacity().as_str();
    let forecast = ctx.rainfall_forecast.unwrap_or(0.0);

    match IrrigationMethod::parse(method) {
        Some(IrrigationMethod::RainFed) => format!(
            "Predicted method: RAIN-FED. Suitable if rainfall remains consistent. Since forecast \
             rainfall is {:.1} mm, monitor closely. For {}, ensure the soil ({}) retains enough \
             water (capacity: {}).",
            forecast, ctx.crop, soil, capacity
        ),
        Some(IrrigationMethod::Drip) => {
            let area = ctx
                .area_acres
                .map(|a| format!(" Helps save water in your {:.1} acre field.", a))
                .unwrap_or_default();
            format!(
                "Predicted method: DRIP irrigation. Recommended for efficient water use. Good \
                 choice for {}, especially under current temperature {:.1}°C and humidity {:.1}%.{}",
                ctx.crop, ctx.weather.temperature, ctx.weather.humidity, area
            )
        }
        Some(IrrigationMethod::Sprinkler) => format!(
            "Predicted method: SPRINKLER irrigation. Useful for lighter soils like {} and crops \
             sensitive to uniform watering. With rainfall forecast {:.1} mm, sprinkler ensures \
             even distribution.",
            soil, forecast
        ),
        Some(IrrigationMethod::Furrow) => format!(
            "Predicted method: FURROW irrigation. Works well for row crops and moderate slopes. \
             Soil water capacity is {}. Consider runoff if slope is high.",
            capacity
        ),
        None => UNINTERPRETABLE_ADVICE.to_string(),
    }
}

// ============================================================================
// Pest Risk
// ============================================================================

/// Pest risk buckets the classifier emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PestRisk {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl PestRisk {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "low" => Some(PestRisk::Low),
            "medium" | "moderate" => Some(PestRisk::Medium),
            "high" => Some(PestRisk::High),
            "very high" => Some(PestRisk::VeryHigh),
            _ => None,
        }
    }
}

fn pest_advice(risk: &str, ctx: &AdvisoryContext<'_>) -> String {
    let stage = ctx.growth_stage.unwrap_or("current");
    let w = ctx.weather;

    match PestRisk::parse(risk) {
        Some(PestRisk::Low) => format!(
            "Pest risk is LOW for {} at {} stage. Continue regular field monitoring. Current \
             weather (T={:.1}°C, H={:.1}%) may still attract minor pests, but no major action \
             is needed.",
            ctx.crop, stage, w.temperature, w.humidity
        ),
        Some(PestRisk::Medium) => format!(
            "Pest risk is MODERATE for {} at {} stage. Keep a close watch on leaves and stems. \
             Consider organic repellents or neem spray as preventive measures, especially since \
             soil pH is {:.1} and rainfall is {:.1} mm.",
            ctx.crop, stage, ctx.soil.ph, w.rainfall
        ),
        Some(PestRisk::High) => format!(
            "Pest risk is HIGH for {} at {} stage. Immediate monitoring is required. Consult a \
             local agri expert and consider appropriate pesticide application. High humidity \
             ({:.1}%) and {:.1} mm rainfall increase the chance of an outbreak.",
            ctx.crop, stage, w.humidity, w.rainfall
        ),
        Some(PestRisk::VeryHigh) => format!(
            "Pest risk is VERY HIGH for {} at {} stage. Inspect the field today and begin \
             control measures without delay. Humidity of {:.1}% at {:.1}°C with {:.1} mm \
             rainfall strongly favours an outbreak; coordinate treatment with neighbouring farms.",
            ctx.crop, stage, w.humidity, w.temperature, w.rainfall
        ),
        None => UNINTERPRETABLE_ADVICE.to_string(),
    }
}

// ============================================================================
// Yield
// ============================================================================

fn yield_advice(kg_per_acre: f64, ctx: &AdvisoryContext<'_>) -> String {
    if !kg_per_acre.is_finite() || kg_per_acre < 0.0 {
        return UNINTERPRETABLE_ADVICE.to_string();
    }

    match ctx.area_acres {
        Some(area) if area > 0.0 => format!(
            "Expected {} yield is about {:.2} kg per acre, roughly {:.2} kg across your {:.1} acres.",
            ctx.crop,
            kg_per_acre,
            kg_per_acre * area,
            area
        ),
        _ => format!(
            "Expected {} yield is about {:.2} kg per acre.",
            ctx.crop, kg_per_acre
        ),
    }
}
