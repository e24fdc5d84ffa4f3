use flowsync::easing::{EASING_COUNT, EASING_FUNCTIONS};
use flowsync::{Easing, TimelineError};

const EPS: f32 = 1e-4;

// =============================================================================
// Table Tests
// =============================================================================

#[test]
fn test_table_has_31_entries_in_id_order() {
    assert_eq!(EASING_COUNT, 31);
    assert_eq!(EASING_FUNCTIONS.len(), 31);
    for (index, easing) in Easing::ALL.iter().enumerate() {
        assert_eq!(easing.id() as usize, index);
    }
    assert_eq!(Easing::Linear.id(), 0);
    assert_eq!(Easing::InQuad.id(), 1);
    assert_eq!(Easing::InOutBounce.id(), 30);
}

#[test]
fn test_ids_resolve() {
    assert_eq!(Easing::try_from(0u8), Ok(Easing::Linear));
    assert_eq!(Easing::try_from(17u8), Ok(Easing::OutExpo));
    assert_eq!(Easing::try_from(30u8), Ok(Easing::InOutBounce));
    assert_eq!(Easing::try_from(31u8), Err(TimelineError::UnknownEasing(31)));
    assert_eq!(Easing::try_from(255u8), Err(TimelineError::UnknownEasing(255)));
}

// =============================================================================
// Curve Tests
// =============================================================================

#[test]
fn test_every_easing_maps_endpoints() {
    for easing in Easing::ALL {
        assert!(easing.apply(0.0).abs() < EPS, "{:?} at 0", easing);
        assert!((easing.apply(1.0) - 1.0).abs() < EPS, "{:?} at 1", easing);
    }
}

#[test]
fn test_linear_is_identity() {
    for t in [0.0, 0.1, 0.25, 0.5, 0.9, 1.0] {
        assert_eq!(Easing::Linear.apply(t), t);
    }
}

#[test]
fn test_quadratic_midpoints() {
    assert_eq!(Easing::InQuad.apply(0.5), 0.25);
    assert_eq!(Easing::OutQuad.apply(0.5), 0.75);
    assert_eq!(Easing::InOutQuad.apply(0.5), 0.5);
    assert_eq!(Easing::InCubic.apply(0.5), 0.125);
}

#[test]
fn test_in_out_curves_are_symmetric_at_half() {
    for easing in [
        Easing::InOutQuad,
        Easing::InOutCubic,
        Easing::InOutQuart,
        Easing::InOutQuint,
        Easing::InOutSine,
        Easing::InOutExpo,
        Easing::InOutCirc,
    ] {
        assert!((easing.apply(0.5) - 0.5).abs() < EPS, "{:?}", easing);
    }
}

#[test]
fn test_back_and_elastic_overshoot() {
    // Back pulls below zero before heading to the target.
    assert!(Easing::InBack.apply(0.2) < 0.0);
    // Back and elastic out-curves pass the target before settling.
    assert!(Easing::OutBack.apply(0.8) > 1.0);
    assert!(Easing::OutElastic.apply(0.1) > 1.0);
}

#[test]
fn test_bounce_stays_in_range() {
    for step in 0..=100 {
        let t = step as f32 / 100.0;
        for easing in [Easing::InBounce, Easing::OutBounce, Easing::InOutBounce] {
            let v = easing.apply(t);
            assert!((-EPS..=1.0 + EPS).contains(&v), "{:?} at {}: {}", easing, t, v);
        }
    }
}
