//! Immutable scoring configuration.
//!
//! Every weight, expectation scaler, and normalization table lives here,
//! constructed once at startup and passed by reference into the pipeline.
//! [`ScoringConfig::default`] carries the calibrated tables;
//! [`ScoringConfig::from_toml_str`] loads a versioned override file with
//! the same shape. Feature toggles (the dominance guard, canopy
//! saturation) are plain fields, so A/B comparisons in tests just build
//! two configs — no process-wide state.

use std::collections::BTreeMap;

use beauty_map_geo_models::AreaType;
use serde::{Deserialize, Serialize};

/// Per-area-type weights for the three context sub-scores. Should sum to
/// roughly 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTriple {
    /// Weight on the topography sub-score.
    pub topography: f64,
    /// Weight on the land-cover sub-score.
    pub landcover: f64,
    /// Weight on the water sub-score.
    pub water: f64,
}

/// Neutral weights used when an area type has no configured triple.
const NEUTRAL_WEIGHTS: WeightTriple = WeightTriple {
    topography: 0.34,
    landcover: 0.33,
    water: 0.33,
};

/// Area-type normalization parameters: `clamp(min(max, raw*scale + shift), 0, 100)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationParams {
    /// Additive shift applied after scaling.
    pub shift: f64,
    /// Multiplicative scale applied to the raw 0-100 score.
    pub scale: f64,
    /// Ceiling for this area type.
    pub max: f64,
}

/// The load-once scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Rebalance the context bonus when one component exceeds a 60%
    /// share. Off by default: the validator surfaces dominance as a
    /// warning instead, and turning the guard on is a product decision.
    pub dominance_guard: bool,
    /// Saturate the canopy curve above 50% canopy (slope 0.25 to 48,
    /// then flat). With this off the curve keeps climbing to 50.
    pub canopy_saturation: bool,
    /// Context sub-score weights per area type.
    pub weights: BTreeMap<AreaType, WeightTriple>,
    /// Greenery-bonus multiplier per area type (green views count for
    /// more where greenery is scarce).
    pub greenery_multiplier: BTreeMap<AreaType, f64>,
    /// Scaler on the expectation bonus/penalty per area type.
    pub expectation_scaler: BTreeMap<AreaType, f64>,
    /// Normalization parameters per area type. Area types without an
    /// entry pass through clamped but unshifted.
    pub normalization: BTreeMap<AreaType, NormalizationParams>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let weights = BTreeMap::from([
            (AreaType::UrbanCore, triple(0.30, 0.40, 0.30)),
            (AreaType::UrbanCoreLowrise, triple(0.30, 0.40, 0.30)),
            (AreaType::HistoricUrban, triple(0.30, 0.35, 0.35)),
            (AreaType::UrbanResidential, triple(0.35, 0.35, 0.30)),
            (AreaType::Suburban, triple(0.35, 0.30, 0.35)),
            (AreaType::Exurban, triple(0.35, 0.30, 0.35)),
            (AreaType::Rural, triple(0.30, 0.30, 0.40)),
        ]);

        let greenery_multiplier = BTreeMap::from([
            (AreaType::UrbanCore, 1.10),
            (AreaType::UrbanCoreLowrise, 1.05),
            (AreaType::HistoricUrban, 1.05),
            (AreaType::UrbanResidential, 1.00),
            (AreaType::Suburban, 0.90),
            (AreaType::Exurban, 0.80),
            (AreaType::Rural, 0.70),
        ]);

        let expectation_scaler = BTreeMap::from([
            (AreaType::UrbanCore, 0.70),
            (AreaType::UrbanCoreLowrise, 0.75),
            (AreaType::HistoricUrban, 0.80),
            (AreaType::UrbanResidential, 0.90),
            (AreaType::Suburban, 1.00),
            (AreaType::Exurban, 1.10),
            (AreaType::Rural, 1.20),
        ]);

        let normalization = BTreeMap::from([
            (AreaType::UrbanCore, params(6.0, 0.90, 92.0)),
            (AreaType::UrbanCoreLowrise, params(4.0, 0.92, 94.0)),
            (AreaType::HistoricUrban, params(5.0, 0.90, 94.0)),
            (AreaType::UrbanResidential, params(-5.0, 0.80, 96.0)),
            (AreaType::Suburban, params(0.0, 1.00, 98.0)),
            (AreaType::Exurban, params(0.0, 1.00, 100.0)),
            (AreaType::Rural, params(0.0, 1.00, 100.0)),
        ]);

        Self {
            dominance_guard: false,
            canopy_saturation: true,
            weights,
            greenery_multiplier,
            expectation_scaler,
            normalization,
        }
    }
}

impl ScoringConfig {
    /// Parses a configuration from TOML.
    ///
    /// Missing sections fall back to the calibrated defaults via
    /// `#[serde(default)]`, so an override file only has to name what it
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns the TOML deserialization error on malformed input.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Context sub-score weights for an area type.
    #[must_use]
    pub fn weights_for(&self, area_type: AreaType) -> WeightTriple {
        self.weights.get(&area_type).copied().unwrap_or(NEUTRAL_WEIGHTS)
    }

    /// Greenery multiplier for an area type (0.9 when unconfigured).
    #[must_use]
    pub fn greenery_multiplier_for(&self, area_type: AreaType) -> f64 {
        self.greenery_multiplier
            .get(&area_type)
            .copied()
            .unwrap_or(0.9)
    }

    /// Expectation bonus/penalty scaler for an area type (1.0 when
    /// unconfigured).
    #[must_use]
    pub fn expectation_scaler_for(&self, area_type: AreaType) -> f64 {
        self.expectation_scaler
            .get(&area_type)
            .copied()
            .unwrap_or(1.0)
    }

    /// Normalization parameters for an area type, when defined.
    #[must_use]
    pub fn normalization_for(&self, area_type: AreaType) -> Option<NormalizationParams> {
        self.normalization.get(&area_type).copied()
    }
}

const fn triple(topography: f64, landcover: f64, water: f64) -> WeightTriple {
    WeightTriple {
        topography,
        landcover,
        water,
    }
}

const fn params(shift: f64, scale: f64, max: f64) -> NormalizationParams {
    NormalizationParams { shift, scale, max }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weight_triples_sum_to_one() {
        let config = ScoringConfig::default();
        for (area_type, weights) in &config.weights {
            let sum = weights.topography + weights.landcover + weights.water;
            assert!(
                (sum - 1.0).abs() < 1e-9,
                "weights for {area_type} sum to {sum}"
            );
        }
    }

    #[test]
    fn unknown_area_type_gets_neutral_tables() {
        let config = ScoringConfig::default();
        let weights = config.weights_for(AreaType::Unknown);
        assert!((weights.topography - 0.34).abs() < f64::EPSILON);
        assert!(config.normalization_for(AreaType::Unknown).is_none());
    }

    #[test]
    fn toml_override_keeps_unnamed_defaults() {
        let config = ScoringConfig::from_toml_str(
            r#"
dominanceGuard = true

[weights.rural]
topography = 0.2
landcover = 0.2
water = 0.6
"#,
        )
        .unwrap();

        assert!(config.dominance_guard);
        assert!(config.canopy_saturation, "untouched flag keeps its default");
        let rural = config.weights_for(AreaType::Rural);
        assert!((rural.water - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(ScoringConfig::from_toml_str("weights = 3").is_err());
    }
}
