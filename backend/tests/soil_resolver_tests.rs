//! Soil resolver property-based tests
//!
//! Whatever the soil service returns, resolution must yield a usable profile.

mod common;

use std::sync::Arc;

use common::{reference, StubSoil, NAGPUR};
use crop_advisory::data::ReferenceDataset;
use crop_advisory::services::SoilResolver;
use proptest::prelude::*;
use shared::{SoilSource, SoilType, DEFAULT_SOIL_PH};

// ============================================================================
// Property Test Strategies
// ============================================================================

fn remote_ph_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (3.0f64..10.0).prop_map(Some)]
}

fn wrb_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Vertisols".to_string())),
        Just(Some("Arenosol".to_string())),
        Just(Some("Cryosols".to_string())),
        "[A-Za-z]{0,12}".prop_map(Some),
    ]
}

fn hint_strategy() -> impl Strategy<Value = Option<SoilType>> {
    prop_oneof![
        Just(None),
        prop::sample::select(SoilType::KNOWN.to_vec()).prop_map(Some),
    ]
}

fn crop_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("rice".to_string())),
        Just(Some("wheat".to_string())),
        "[a-z]{1,10}".prop_map(Some),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolution always produces a finite pH within the observed range
    #[test]
    fn prop_resolution_is_total(
        ph in remote_ph_strategy(),
        wrb in wrb_strategy(),
        hint in hint_strategy(),
        crop in crop_strategy(),
        with_reference in any::<bool>(),
    ) {
        let reference = if with_reference { reference() } else { ReferenceDataset::empty() };
        let resolver = SoilResolver::new(
            Arc::new(StubSoil { ph, wrb: wrb.clone() }),
            Arc::new(reference),
        );

        let profile = tokio_test::block_on(resolver.resolve(NAGPUR, crop.as_deref(), hint));

        prop_assert!(profile.ph.is_finite());
        prop_assert!((3.0..10.0).contains(&profile.ph) || profile.ph == DEFAULT_SOIL_PH);

        match (ph, &wrb) {
            (Some(remote), Some(_)) => {
                prop_assert_eq!(profile.source, SoilSource::Remote);
                prop_assert_eq!(profile.ph, remote);
            }
            _ => prop_assert_ne!(profile.source, SoilSource::Remote),
        }

        if !with_reference && (ph.is_none() || wrb.is_none()) {
            prop_assert_eq!(profile.source, SoilSource::Default);
            prop_assert_eq!(profile.ph, DEFAULT_SOIL_PH);
        }
    }

    /// A known hint survives fallback when the remote classification is missing
    #[test]
    fn prop_hint_respected_on_fallback(hint in prop::sample::select(SoilType::KNOWN.to_vec())) {
        let resolver = SoilResolver::new(Arc::new(StubSoil::unreachable()), Arc::new(reference()));
        let profile = tokio_test::block_on(resolver.resolve(NAGPUR, None, Some(hint)));

        match profile.source {
            SoilSource::ReferenceFiltered | SoilSource::ReferenceGlobal => {
                prop_assert_eq!(profile.soil_type, hint)
            }
            other => prop_assert!(false, "unexpected source {:?}", other),
        }
    }
}

#[test]
fn test_partial_remote_answer_falls_back() {
    let resolver = SoilResolver::new(
        Arc::new(StubSoil {
            ph: Some(6.2),
            wrb: None,
        }),
        Arc::new(reference()),
    );
    let profile = tokio_test::block_on(resolver.resolve(NAGPUR, Some("wheat"), None));

    assert_eq!(profile.source, SoilSource::ReferenceFiltered);
    assert_eq!(profile.ph, 7.8);
    assert_eq!(profile.soil_type, SoilType::Clay);
}
