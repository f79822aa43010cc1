//! Deterministic fallback scorer.
//!
//! Maps diagnostics to a bounded day-count with no model call and no
//! failure mode. Adjustments are order-fixed and saturating: each one
//! subtracts a single day and floors at 1 before the next is considered.

use tracing::debug;

use super::types::ImageDiagnostics;
use crate::config::EstimatorConfig;

/// Ink coverage below this, with zero text regions, reads as an unlabeled
/// item; the estimate is nudged shorter.
const NO_LABEL_INK_RATIO: f64 = 0.02;
/// Contrast below this reads as a flat, low-information image.
const FLAT_CONTRAST: f64 = 0.05;
/// Brightness above this reads as overexposure or glare.
const OVEREXPOSED_BRIGHTNESS: f64 = 0.8;

/// Score diagnostics into a day-count in `[1, max_shelf_life_days]`.
pub fn score(diagnostics: &ImageDiagnostics, config: &EstimatorConfig) -> u32 {
    let mut days = config.default_shelf_life_days;

    if diagnostics.text_regions == 0 && diagnostics.ink_ratio < NO_LABEL_INK_RATIO {
        days = days.saturating_sub(1).max(1);
    }
    if diagnostics.contrast < FLAT_CONTRAST {
        days = days.saturating_sub(1).max(1);
    }
    if diagnostics.brightness > OVEREXPOSED_BRIGHTNESS {
        days = days.saturating_sub(1).max(1);
    }

    let days = days.min(config.max_shelf_life_days);
    debug!(
        days,
        text_regions = diagnostics.text_regions,
        contrast = diagnostics.contrast,
        brightness = diagnostics.brightness,
        "Heuristic estimate"
    );
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics(brightness: f64, contrast: f64, text_regions: usize, ink_ratio: f64) -> ImageDiagnostics {
        ImageDiagnostics::new(brightness, contrast, text_regions, ink_ratio)
    }

    fn config(default_days: u32, max_days: u32) -> EstimatorConfig {
        EstimatorConfig {
            default_shelf_life_days: default_days,
            max_shelf_life_days: max_days,
            ..EstimatorConfig::default()
        }
    }

    #[test]
    fn clean_labeled_image_keeps_the_default() {
        let d = diagnostics(0.5, 0.2, 2, 0.1);
        assert_eq!(score(&d, &config(3, 30)), 3);
    }

    #[test]
    fn missing_label_costs_one_day() {
        let d = diagnostics(0.5, 0.2, 0, 0.01);
        assert_eq!(score(&d, &config(3, 30)), 2);
    }

    #[test]
    fn label_requires_both_signals_to_be_absent() {
        // Regions present: ink ratio alone does not trigger the adjustment.
        let d = diagnostics(0.5, 0.2, 1, 0.01);
        assert_eq!(score(&d, &config(3, 30)), 3);

        // Ink present: zero regions alone does not trigger it either.
        let d = diagnostics(0.5, 0.2, 0, 0.05);
        assert_eq!(score(&d, &config(3, 30)), 3);
    }

    #[test]
    fn flat_contrast_costs_one_day() {
        let d = diagnostics(0.5, 0.01, 2, 0.1);
        assert_eq!(score(&d, &config(3, 30)), 2);
    }

    #[test]
    fn overexposure_costs_one_day() {
        let d = diagnostics(0.9, 0.2, 2, 0.1);
        assert_eq!(score(&d, &config(3, 30)), 2);
    }

    #[test]
    fn adjustments_compound() {
        let d = diagnostics(0.9, 0.01, 0, 0.0);
        assert_eq!(score(&d, &config(5, 30)), 2);
    }

    #[test]
    fn score_floors_at_one() {
        let d = diagnostics(0.9, 0.01, 0, 0.0);
        assert_eq!(score(&d, &config(1, 30)), 1);
        assert_eq!(score(&d, &config(2, 30)), 1);
    }

    #[test]
    fn score_is_capped_at_max() {
        let d = diagnostics(0.5, 0.2, 2, 0.1);
        assert_eq!(score(&d, &config(10, 4)), 4);
    }

    #[test]
    fn score_stays_in_bounds() {
        let cases = [
            (0.0, 0.0, 0, 0.0),
            (1.0, 0.0, 0, 0.0),
            (0.5, 1.0, 10, 1.0),
            (0.9, 0.01, 0, 0.019),
        ];
        for (b, c, t, i) in cases {
            for (default_days, max_days) in [(1, 1), (3, 30), (30, 30), (5, 5)] {
                let days = score(&diagnostics(b, c, t, i), &config(default_days, max_days));
                assert!(
                    (1..=max_days).contains(&days),
                    "days={days} out of [1, {max_days}]"
                );
            }
        }
    }

    #[test]
    fn score_is_pure() {
        let d = diagnostics(0.9, 0.01, 0, 0.0);
        let cfg = config(4, 30);
        assert_eq!(score(&d, &cfg), score(&d, &cfg));
    }
}
