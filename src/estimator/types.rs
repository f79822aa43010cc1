//! Value types shared across the estimation pipeline.

use serde::{Deserialize, Serialize};

/// Quantitative summary of one image, produced once per request by the
/// diagnostics extractor and consumed by both estimation paths.
///
/// The float fields are rounded to 3 decimal places at construction. The
/// canonical form keeps results reproducible across platforms and makes
/// them safe to compare and hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDiagnostics {
    /// Mean luminance / 255, in `[0, 1]`.
    pub brightness: f64,
    /// Luminance standard deviation / 255, in `[0, 1]`.
    pub contrast: f64,
    /// Connected ink regions large enough to be printed-label candidates.
    pub text_regions: usize,
    /// Foreground share of the binarized image, in `[0, 1]`.
    pub ink_ratio: f64,
}

impl ImageDiagnostics {
    /// Build the canonical (rounded) form.
    pub fn new(brightness: f64, contrast: f64, text_regions: usize, ink_ratio: f64) -> Self {
        Self {
            brightness: round3(brightness),
            contrast: round3(contrast),
            text_regions,
            ink_ratio: round3(ink_ratio),
        }
    }
}

/// Which estimator produced the final day-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Remote,
    Heuristic,
}

/// Final outcome of one estimation request. Constructed exactly once by the
/// orchestrator and never mutated.
///
/// Invariant: `estimated_days` is in `[1, max_shelf_life_days]` regardless
/// of source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    pub estimated_days: u32,
    pub source: EstimateSource,
    pub diagnostics: ImageDiagnostics,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_are_canonicalized_to_three_decimals() {
        let d = ImageDiagnostics::new(0.501_96, 0.123_456, 2, 0.019_99);
        assert_eq!(d.brightness, 0.502);
        assert_eq!(d.contrast, 0.123);
        assert_eq!(d.text_regions, 2);
        assert_eq!(d.ink_ratio, 0.02);
    }

    #[test]
    fn source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(EstimateSource::Remote).unwrap(),
            serde_json::json!("remote")
        );
        assert_eq!(
            serde_json::to_value(EstimateSource::Heuristic).unwrap(),
            serde_json::json!("heuristic")
        );
    }

    #[test]
    fn diagnostics_round_trip_as_json() {
        let d = ImageDiagnostics::new(0.5, 0.2, 0, 0.01);
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["brightness"], serde_json::json!(0.5));
        assert_eq!(value["text_regions"], serde_json::json!(0));
        let back: ImageDiagnostics = serde_json::from_value(value).unwrap();
        assert_eq!(back, d);
    }
}
