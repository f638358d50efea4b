//! Agronomic reference dataset
//!
//! A CSV of soil samples with crop, soil type, pH and N/P/K columns. It backs
//! the soil fallback tiers and the NPK requirement lookup.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use shared::{nan_mean, same_category, NpkEstimate, SoilType};

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceRow {
    #[serde(alias = "Soil_Type", default)]
    pub soil_type: String,

    #[serde(alias = "Crop", default)]
    pub crop: String,

    #[serde(
        alias = "pH",
        alias = "pH_Value",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub ph: Option<f64>,

    #[serde(
        alias = "Nitrogen",
        alias = "N",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub nitrogen: Option<f64>,

    #[serde(
        alias = "Phosphorus",
        alias = "P",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub phosphorus: Option<f64>,

    #[serde(
        alias = "Potassium",
        alias = "K",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub potassium: Option<f64>,
}

impl ReferenceRow {
    pub fn soil(&self) -> SoilType {
        SoilType::parse(&self.soil_type)
    }
}

/// In-memory reference rows, immutable after startup
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    rows: Vec<ReferenceRow>,
}

impl ReferenceDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    pub fn load(path: &Path) -> Result<Self, csv::Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let rows = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader)
            .deserialize()
            .collect::<Result<Vec<ReferenceRow>, _>>()?;
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // ========================================================================
    // Soil queries
    // ========================================================================

    /// Rows matching `soil_type`, narrowed to `crop` when that leaves any rows.
    ///
    /// Without a known soil type every row is a candidate.
    pub fn soil_candidates(
        &self,
        soil_type: Option<SoilType>,
        crop: Option<&str>,
    ) -> Vec<&ReferenceRow> {
        let by_soil: Vec<&ReferenceRow> = match soil_type.filter(SoilType::is_known) {
            Some(soil) => self.rows.iter().filter(|r| r.soil() == soil).collect(),
            None => self.rows.iter().collect(),
        };

        if let Some(crop) = crop {
            let by_crop: Vec<&ReferenceRow> = by_soil
                .iter()
                .copied()
                .filter(|r| same_category(&r.crop, crop))
                .collect();
            if !by_crop.is_empty() {
                return by_crop;
            }
        }
        by_soil
    }

    /// Mean pH over every row
    pub fn global_mean_ph(&self) -> Option<f64> {
        mean_ph(self.rows.iter())
    }

    // ========================================================================
    // NPK requirements
    // ========================================================================

    /// Mean N/P/K for (soil, crop), relaxing to crop only, then the whole dataset
    pub fn npk_estimate(&self, soil_type: Option<SoilType>, crop: &str) -> Option<NpkEstimate> {
        let crop_rows = || self.rows.iter().filter(|r| same_category(&r.crop, crop));

        if let Some(soil) = soil_type.filter(SoilType::is_known) {
            if let Some(npk) = npk_mean(crop_rows().filter(|r| r.soil() == soil)) {
                return Some(npk);
            }
        }
        if let Some(npk) = npk_mean(crop_rows()) {
            return Some(npk);
        }

        let npk = npk_mean(self.rows.iter());
        if npk.is_some() {
            tracing::warn!(crop, "No reference rows for crop; using dataset-wide NPK means");
        }
        npk
    }
}

/// NaN-excluding mean pH; None when no row carries a finite pH
pub fn mean_ph<'a>(rows: impl IntoIterator<Item = &'a ReferenceRow>) -> Option<f64> {
    let mean = nan_mean(rows.into_iter().map(|r| r.ph.unwrap_or(f64::NAN)));
    mean.is_finite().then_some(mean)
}

/// Most frequent known soil type; ties go to the earlier variant
pub fn modal_soil_type<'a>(rows: impl IntoIterator<Item = &'a ReferenceRow>) -> Option<SoilType> {
    let mut counts: BTreeMap<SoilType, usize> = BTreeMap::new();
    for row in rows {
        let soil = row.soil();
        if soil.is_known() {
            *counts.entry(soil).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(SoilType, usize)>, (soil, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((soil, n)),
        })
        .map(|(soil, _)| soil)
}

fn npk_mean<'a>(rows: impl Iterator<Item = &'a ReferenceRow>) -> Option<NpkEstimate> {
    let rows: Vec<&ReferenceRow> = rows.collect();
    if rows.is_empty() {
        return None;
    }
    let mean = |f: fn(&ReferenceRow) -> Option<f64>| {
        nan_mean(rows.iter().map(|r| f(r).unwrap_or(f64::NAN)))
    };
    let estimate = NpkEstimate {
        nitrogen: mean(|r| r.nitrogen),
        phosphorus: mean(|r| r.phosphorus),
        potassium: mean(|r| r.potassium),
    };
    (estimate.nitrogen.is_finite()
        && estimate.phosphorus.is_finite()
        && estimate.potassium.is_finite())
        .then_some(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Soil_Type,Crop,pH,Nitrogen,Phosphorus,Potassium
Sandy,Rice,5.5,80,40,40
Sandy,Rice,6.5,100,60,20
Sandy,Wheat,7.5,60,30,30
Clay,Rice,8.0,120,50,60
Loamy,Maize,6.8,,45,35
";

    fn dataset() -> ReferenceDataset {
        ReferenceDataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_aliased_headers() {
        let data = dataset();
        assert_eq!(data.len(), 5);
        assert_eq!(data.rows[0].soil(), SoilType::Sandy);
        assert_eq!(data.rows[0].ph, Some(5.5));
        assert_eq!(data.rows[4].nitrogen, None);
    }

    #[test]
    fn test_soil_candidates_narrow_by_crop() {
        let data = dataset();
        let rows = data.soil_candidates(Some(SoilType::Sandy), Some("rice"));
        assert_eq!(rows.len(), 2);
        assert_eq!(mean_ph(rows), Some(6.0));
    }

    #[test]
    fn test_soil_candidates_ignore_unmatched_crop() {
        let data = dataset();
        let rows = data.soil_candidates(Some(SoilType::Sandy), Some("cotton"));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_soil_candidates_can_be_empty() {
        let data = dataset();
        assert!(data.soil_candidates(Some(SoilType::Peaty), None).is_empty());
    }

    #[test]
    fn test_modal_soil_type() {
        let data = dataset();
        assert_eq!(
            modal_soil_type(data.soil_candidates(None, Some("Rice"))),
            Some(SoilType::Sandy)
        );
        assert_eq!(modal_soil_type(std::iter::empty()), None);
    }

    #[test]
    fn test_npk_relaxes_filters() {
        let data = dataset();

        let exact = data.npk_estimate(Some(SoilType::Sandy), "rice").unwrap();
        assert_eq!(exact.nitrogen, 90.0);

        // no Peaty rice rows: crop only
        let crop_only = data.npk_estimate(Some(SoilType::Peaty), "Rice").unwrap();
        assert!((crop_only.nitrogen - 100.0).abs() < 1e-9);

        // unknown crop: whole dataset, missing nitrogen excluded
        let global = data.npk_estimate(None, "quinoa").unwrap();
        assert!((global.nitrogen - 90.0).abs() < 1e-9);
        assert!((global.phosphorus - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dataset() {
        let data = ReferenceDataset::empty();
        assert!(data.global_mean_ph().is_none());
        assert!(data.npk_estimate(None, "rice").is_none());
    }
}
