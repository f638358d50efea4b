//! Soil resolution with tiered fallback
//!
//! Tiers, first that yields wins:
//! 1. remote pH and WRB classification
//! 2. reference rows filtered by soil type, then crop
//! 3. reference-wide mean pH
//! 4. neutral default (pH 7.0, Unknown)

use std::sync::Arc;

use shared::{map_soil_type, Location, SoilProfile, SoilSource, SoilType};

use crate::data::reference::{mean_ph, modal_soil_type};
use crate::data::ReferenceDataset;
use crate::external::SoilPropertiesSource;

#[derive(Clone)]
pub struct SoilResolver {
    source: Arc<dyn SoilPropertiesSource>,
    reference: Arc<ReferenceDataset>,
}

impl SoilResolver {
    pub fn new(source: Arc<dyn SoilPropertiesSource>, reference: Arc<ReferenceDataset>) -> Self {
        Self { source, reference }
    }

    /// Best available soil profile; never fails
    pub async fn resolve(
        &self,
        location: Location,
        crop: Option<&str>,
        hint: Option<SoilType>,
    ) -> SoilProfile {
        let (ph, wrb) = tokio::join!(self.source.ph(location), self.source.wrb_class(location));

        let ph = match ph {
            Ok(ph) => ph.filter(|v| v.is_finite()),
            Err(e) => {
                tracing::warn!(error = %e, "Soil pH lookup failed");
                None
            }
        };
        let wrb = match wrb {
            Ok(class) => class,
            Err(e) => {
                tracing::warn!(error = %e, "Soil classification lookup failed");
                None
            }
        };

        if let (Some(ph), Some(class)) = (ph, wrb.as_deref()) {
            let soil_type = map_soil_type(class);
            tracing::debug!(ph, wrb = class, soil_type = %soil_type, "Soil resolved remotely");
            return SoilProfile {
                ph,
                soil_type,
                wrb_classification: Some(class.to_string()),
                source: SoilSource::Remote,
            };
        }

        let mut profile = self.from_reference(wrb.as_deref().map(map_soil_type), crop, hint);
        profile.wrb_classification = wrb;
        profile
    }

    fn from_reference(
        &self,
        remote: Option<SoilType>,
        crop: Option<&str>,
        hint: Option<SoilType>,
    ) -> SoilProfile {
        let hint = hint.filter(SoilType::is_known);

        if self.reference.is_empty() {
            tracing::warn!("Soil service incomplete and no reference data; using default profile");
            return SoilProfile::default_profile();
        }

        let filter = remote.filter(SoilType::is_known).or(hint);
        let rows = self.reference.soil_candidates(filter, crop);
        if let Some(ph) = mean_ph(rows.iter().copied()) {
            let soil_type = modal_soil_type(rows)
                .or(filter)
                .unwrap_or(SoilType::Unknown);
            tracing::warn!(
                ph,
                soil_type = %soil_type,
                "Soil service incomplete; using filtered reference data"
            );
            return SoilProfile {
                ph,
                soil_type,
                wrb_classification: None,
                source: SoilSource::ReferenceFiltered,
            };
        }

        let soil_type = hint.unwrap_or(SoilType::Unknown);
        match self.reference.global_mean_ph() {
            Some(ph) => {
                tracing::warn!(ph, "No matching reference rows; using dataset-wide mean pH");
                SoilProfile {
                    ph,
                    soil_type,
                    wrb_classification: None,
                    source: SoilSource::ReferenceGlobal,
                }
            }
            None => {
                tracing::warn!("Reference data carries no pH values; using default profile");
                SoilProfile {
                    soil_type,
                    ..SoilProfile::default_profile()
                }
            }
        }
    }
}
