// SPDX-License-Identifier: GPL-3.0-only

//! Property tests for zoom clamping

use proptest::prelude::*;
use snapcam::app::ZoomState;

proptest! {
    #[test]
    fn clamped_factor_stays_in_range(factor in -50.0f64..50.0, device_max in 0.0f64..20.0) {
        let zoom = ZoomState::new(1.0, 5.0);
        let clamped = zoom.clamp_factor(factor, device_max);

        prop_assert!(clamped >= 1.0);
        prop_assert!(clamped <= 5.0);
        prop_assert!(clamped <= device_max.max(1.0));
    }

    #[test]
    fn in_range_factor_unchanged(factor in 1.0f64..=5.0) {
        let zoom = ZoomState::new(1.0, 5.0);
        prop_assert_eq!(zoom.clamp_factor(factor, 10.0), factor);
    }

    #[test]
    fn progress_is_normalized(factor in 1.0f64..=5.0) {
        let zoom = ZoomState::new(1.0, 5.0);
        let progress = zoom.progress(factor);

        prop_assert!((0.0..=1.0).contains(&progress));
        let expected = ((factor - 1.0) / 4.0) as f32;
        prop_assert!((progress - expected).abs() < 1e-6);
    }
}

#[test]
fn nan_request_clamps_to_minimum() {
    let zoom = ZoomState::new(1.0, 5.0);
    assert_eq!(zoom.clamp_factor(f64::NAN, 10.0), 1.0);
}
