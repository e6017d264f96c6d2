#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Measurement and score-breakdown types for the natural-beauty pipeline.
//!
//! Raw physical measurements arrive as [`ContextMetrics`]; the pipeline
//! produces a [`ScoreBreakdown`] in which every intermediate quantity is a
//! typed field rather than a nested map, so each stage can be tested in
//! isolation and the outer aggregator can explain any score it receives.

use beauty_map_canopy::CanopyEstimate;
use beauty_map_climate::ClimateContext;
use beauty_map_geo_models::AreaType;
use serde::{Deserialize, Serialize};

/// Terrain measurements over the scoring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topography {
    /// Elevation range (max minus min) within the buffer, meters.
    pub relief_range_m: f64,
    /// Mean slope within the buffer, degrees.
    pub slope_mean_deg: f64,
    /// Maximum slope within the buffer, degrees.
    pub slope_max_deg: f64,
    /// Fraction (0-1) of the buffer steeper than 15 degrees.
    pub steep_fraction: f64,
}

/// Land-cover composition over the scoring buffer, percentages of area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandCover {
    /// Tree-dominated cover.
    pub forest_pct: f64,
    /// Wetland cover.
    pub wetland_pct: f64,
    /// Shrub and scrub cover.
    pub shrub_pct: f64,
    /// Grass and herbaceous cover.
    pub grass_pct: f64,
    /// Built-up / impervious cover.
    pub developed_pct: f64,
    /// Open surface water.
    pub water_pct: f64,
}

/// Raw measurements consumed by the context-bonus aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetrics {
    /// Terrain measurements.
    pub topography: Topography,
    /// Land-cover composition.
    pub landcover: LandCover,
}

impl ContextMetrics {
    /// Returns a copy with every field forced into its documented range.
    ///
    /// Out-of-range values and NaNs are measurement bugs upstream; they
    /// are clamped (NaN to zero) with a logged warning rather than allowed
    /// to poison the arithmetic or crash the request.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            topography: Topography {
                relief_range_m: clamp_field("relief_range_m", self.topography.relief_range_m, 0.0, f64::MAX),
                slope_mean_deg: clamp_field("slope_mean_deg", self.topography.slope_mean_deg, 0.0, 90.0),
                slope_max_deg: clamp_field("slope_max_deg", self.topography.slope_max_deg, 0.0, 90.0),
                steep_fraction: clamp_field("steep_fraction", self.topography.steep_fraction, 0.0, 1.0),
            },
            landcover: LandCover {
                forest_pct: clamp_field("forest_pct", self.landcover.forest_pct, 0.0, 100.0),
                wetland_pct: clamp_field("wetland_pct", self.landcover.wetland_pct, 0.0, 100.0),
                shrub_pct: clamp_field("shrub_pct", self.landcover.shrub_pct, 0.0, 100.0),
                grass_pct: clamp_field("grass_pct", self.landcover.grass_pct, 0.0, 100.0),
                developed_pct: clamp_field("developed_pct", self.landcover.developed_pct, 0.0, 100.0),
                water_pct: clamp_field("water_pct", self.landcover.water_pct, 0.0, 100.0),
            },
        }
    }
}

/// Clamps one measurement into range, warning when it had to move.
fn clamp_field(name: &str, value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        log::warn!("measurement {name} is NaN; using 0");
        return min.max(0.0);
    }
    let clamped = value.clamp(min, max);
    if (clamped - value).abs() > f64::EPSILON {
        log::warn!("measurement {name} = {value} outside [{min}, {max}]; clamped to {clamped}");
    }
    clamped
}

/// Satellite greenness-product outputs, each normalized into [0, 1].
///
/// Present only where the greenness product has coverage; the composer
/// falls back to canopy/street-tree proxies otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenerySignals {
    /// Street-level tree canopy visibility.
    pub canopy_visibility: f64,
    /// Ratio of green space within the buffer.
    pub green_space_ratio: f64,
    /// Vegetation health index.
    pub vegetation_health: f64,
    /// Seasonal variance of greenness (high variance reads as less green
    /// year-round, so it enters the blend inverted).
    pub seasonal_variance: f64,
}

/// A scenic viewpoint near the scored location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewpoint {
    /// Feature name, when the map source has one.
    pub name: Option<String>,
    /// Distance from the scored location, meters.
    pub distance_m: f64,
}

/// The three weighted context sub-scores and their capped total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBonus {
    /// Weighted topography points.
    pub topography_pts: f64,
    /// Weighted land-cover points.
    pub landcover_pts: f64,
    /// Weighted water points.
    pub water_pts: f64,
    /// Sum of the weighted components before the cap and guard.
    pub raw_total: f64,
    /// Final context bonus after the dominance guard (if enabled) and the
    /// 20-point cap.
    pub total: f64,
    /// Whether the anti-dominance guard rebalanced the components.
    pub guard_applied: bool,
}

impl ContextBonus {
    /// Share of `raw_total` contributed by the largest component, or
    /// `None` when the total is zero.
    #[must_use]
    pub fn dominant_share(&self) -> Option<(&'static str, f64)> {
        if self.raw_total <= f64::EPSILON {
            return None;
        }
        let components = [
            ("topography", self.topography_pts),
            ("landcover", self.landcover_pts),
            ("water", self.water_pts),
        ];
        components
            .into_iter()
            .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
            .map(|(name, pts)| (name, pts / self.raw_total))
    }
}

/// Non-fatal data-quality flags attached to a finished score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ValidationWarning {
    /// Score landed in a tail that usually means bad input data.
    ExtremeScore {
        /// The suspicious final score.
        score: f64,
    },
    /// The context bonus exceeded its cap by more than 10% — a
    /// calculation bug, since the aggregator is supposed to cap it.
    ContextCapExceeded {
        /// The observed context bonus.
        bonus: f64,
        /// The documented cap.
        cap: f64,
    },
    /// One component carries more than 60% of the context bonus and the
    /// guard was disabled, so nothing corrected it.
    ComponentDominance {
        /// Which component dominates.
        component: String,
        /// Its share of the raw context bonus, 0-1.
        share: f64,
    },
    /// Upstream handed the composer a negative canopy value.
    NegativeCanopy {
        /// The offending value.
        value: f64,
    },
    /// Every canopy source was unavailable; the score was computed from
    /// the remaining signals and should be read with less confidence.
    NoSatelliteData,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtremeScore { score } => {
                write!(f, "score {score:.1} is extreme; verify input data quality")
            }
            Self::ContextCapExceeded { bonus, cap } => {
                write!(f, "context bonus {bonus:.2} exceeds cap {cap:.1} by >10%")
            }
            Self::ComponentDominance { component, share } => {
                write!(
                    f,
                    "{component} carries {:.0}% of the context bonus",
                    share * 100.0
                )
            }
            Self::NegativeCanopy { value } => {
                write!(f, "negative canopy value {value} from upstream")
            }
            Self::NoSatelliteData => write!(f, "no satellite canopy data available"),
        }
    }
}

/// The fully-typed result of one scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Area type the score was calibrated against.
    pub area_type: AreaType,
    /// Climate classification used for expectations.
    pub climate: ClimateContext,
    /// Canopy estimate with provenance.
    pub canopy: CanopyEstimate,
    /// Points from the canopy response curve alone.
    pub tree_base_score: f64,
    /// Street-tree bonus (0-5), nonzero only in low-canopy contexts with
    /// known street-tree counts.
    pub street_tree_bonus: f64,
    /// Greenery-index bonus (0-8 before area weighting).
    pub greenery_bonus: f64,
    /// Land-cover diversity bonus (0-4).
    pub biodiversity_bonus: f64,
    /// Bonus for beating the climate-adjusted canopy expectation (0-6).
    pub expectation_bonus: f64,
    /// Penalty for falling short of the expectation (0-6).
    pub expectation_penalty: f64,
    /// Combined tree/greenery score, clamped to [0, 50].
    pub tree_score: f64,
    /// Context bonus with per-component detail.
    pub context: ContextBonus,
    /// Viewpoint bonus before deduplication.
    pub scenic_bonus_raw: f64,
    /// Viewpoint bonus after the double-counting discount (0-6).
    pub scenic_bonus: f64,
    /// `min(20, scenic_bonus + context.total)`.
    pub natural_bonus_scaled: f64,
    /// Pre-normalization score on the 0-100 scale.
    pub raw_score: f64,
    /// Final score after area-type normalization, in [0, 100].
    pub final_score: f64,
    /// Set when no canopy source had data; the tree score came from
    /// proxies only.
    pub no_satellite_data: bool,
    /// Validator flags, in detection order.
    pub warnings: Vec<ValidationWarning>,
}
