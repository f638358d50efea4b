//! Validation and normalization utilities for the Crop Advisory Platform
//!
//! Categorical values reach the trained encoders only after passing through
//! these helpers, so the casing rules here must match the training data.

/// Hectares per acre
pub const HECTARES_PER_ACRE: f64 = 0.404686;

// ============================================================================
// Unit Conversions
// ============================================================================

/// Convert acres to hectares
pub fn acres_to_hectares(acres: f64) -> f64 {
    acres * HECTARES_PER_ACRE
}

// ============================================================================
// Categorical Normalization
// ============================================================================

/// Title-case each whitespace-separated word ("basmati rice" -> "Basmati Rice")
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trim and lower-case
pub fn lower_case(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Compare two category labels the way the reference dataset is filtered
pub fn same_category(a: &str, b: &str) -> bool {
    title_case(a) == title_case(b)
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate latitude/longitude ranges
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err("Coordinates must be finite numbers");
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a soil pH reading
pub fn validate_ph(ph: f64) -> Result<(), &'static str> {
    if !ph.is_finite() || !(0.0..=14.0).contains(&ph) {
        return Err("pH must be between 0 and 14");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acres_to_hectares() {
        assert!((acres_to_hectares(10.0) - 4.04686).abs() < 1e-9);
        assert_eq!(acres_to_hectares(0.0), 0.0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("rice"), "Rice");
        assert_eq!(title_case("BASMATI rice"), "Basmati Rice");
        assert_eq!(title_case("  sugarcane  "), "Sugarcane");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_lower_case() {
        assert_eq!(lower_case(" Flowering "), "flowering");
    }

    #[test]
    fn test_same_category() {
        assert!(same_category("rice", "Rice"));
        assert!(same_category("SANDY", "Sandy"));
        assert!(!same_category("rice", "wheat"));
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(21.15, 79.09).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_validate_ph() {
        assert!(validate_ph(6.8).is_ok());
        assert!(validate_ph(-0.1).is_err());
        assert!(validate_ph(14.5).is_err());
    }
}
