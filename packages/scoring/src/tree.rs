//! Tree/greenery score composition.
//!
//! The canopy percentage goes through a tiered response curve whose first
//! tier is deliberately steep (1.5 points per percent): inherently
//! low-canopy contexts should not be punished twice, once by physics and
//! once by the curve. On top of the base come the street-tree bonus, the
//! greenery-index bonus, the land-cover biodiversity bonus, and the
//! climate-expectation bonus/penalty, all clamped to their own caps before
//! the final 0-50 clamp.

use beauty_map_climate::ClimateContext;
use beauty_map_geo_models::AreaType;
use beauty_map_scoring_models::{GreenerySignals, LandCover};
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

/// Ceiling of the combined tree score.
pub const TREE_SCORE_MAX: f64 = 50.0;

/// Cap on the street-tree bonus.
const STREET_TREE_CAP: f64 = 5.0;
/// Street-tree count earning the full bonus.
const STREET_TREE_FULL_COUNT: u32 = 20;
/// Cap on the greenery-index bonus.
const GREENERY_CAP: f64 = 8.0;
/// Cap on the biodiversity bonus.
const BIODIVERSITY_CAP: f64 = 4.0;
/// Cap on the expectation bonus and on the penalty.
const EXPECTATION_CAP: f64 = 6.0;
/// Expectation ratio above which the bonus starts.
const EXPECTATION_BONUS_RATIO: f64 = 1.05;
/// Expectation ratio below which the penalty starts.
const EXPECTATION_PENALTY_RATIO: f64 = 0.85;
/// Points per unit of expectation excess/shortfall before area scaling.
const EXPECTATION_SLOPE: f64 = 8.0;

/// The composed tree score with every contribution kept visible.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeComponents {
    /// Points from the canopy response curve.
    pub base: f64,
    /// Street-tree bonus (0-5).
    pub street_tree: f64,
    /// Greenery-index bonus (0-8).
    pub greenery: f64,
    /// Biodiversity bonus (0-4).
    pub biodiversity: f64,
    /// Expectation bonus (0-6).
    pub expectation_bonus: f64,
    /// Expectation penalty (0-6).
    pub expectation_penalty: f64,
    /// Sum of the above, clamped to [0, 50].
    pub total: f64,
}

/// Composes the tree score.
///
/// `canopy_pct = None` takes the zero-data path: no curve points and no
/// expectation term, leaving only the proxy-driven bonuses. That is
/// deliberately different from a measured 0.0, which earns zero curve
/// points *and* the full expectation penalty.
#[must_use]
pub fn compose(
    canopy_pct: Option<f64>,
    street_tree_count: Option<u32>,
    greenery: Option<&GreenerySignals>,
    landcover: &LandCover,
    climate: &ClimateContext,
    area_type: AreaType,
    config: &ScoringConfig,
) -> TreeComponents {
    let base = canopy_pct.map_or(0.0, |c| score_tree_canopy(c, config.canopy_saturation));
    let street_tree = street_tree_bonus(canopy_pct, street_tree_count);
    let greenery = greenery_bonus(
        greenery,
        canopy_pct,
        street_tree_count,
        landcover,
        area_type,
        config,
    );
    let biodiversity = biodiversity_bonus(landcover);

    let (expectation_bonus, expectation_penalty) = canopy_pct.map_or((0.0, 0.0), |c| {
        expectation_adjustment(
            c,
            climate.canopy_expectation_pct(area_type),
            config.expectation_scaler_for(area_type),
        )
    });

    let total = (base + street_tree + greenery + biodiversity + expectation_bonus
        - expectation_penalty)
        .clamp(0.0, TREE_SCORE_MAX);

    TreeComponents {
        base,
        street_tree,
        greenery,
        biodiversity,
        expectation_bonus,
        expectation_penalty,
        total,
    }
}

/// The 5-tier piecewise-linear canopy response curve.
///
/// Monotonically non-decreasing and bounded in [0, 50] for all inputs.
/// With saturation on (the default) the top tiers flatten: 0.25 slope
/// from 50% to 70%, then flat at 48. With saturation off the curve keeps
/// climbing at 0.35 toward the 50-point ceiling.
#[must_use]
pub fn score_tree_canopy(canopy_pct: f64, saturation: bool) -> f64 {
    let c = canopy_pct.clamp(0.0, 100.0);

    if c <= 10.0 {
        c * 1.5
    } else if c <= 20.0 {
        15.0 + (c - 10.0) * 0.7
    } else if c <= 50.0 {
        22.0 + (c - 20.0) * 0.7
    } else if saturation {
        if c <= 70.0 { 43.0 + (c - 50.0) * 0.25 } else { 48.0 }
    } else if c <= 70.0 {
        43.0 + (c - 50.0) * 0.35
    } else {
        50.0
    }
}

/// Street-tree bonus: only in genuinely low-canopy contexts with a known
/// positive count. Linear up to 20 trees.
fn street_tree_bonus(canopy_pct: Option<f64>, street_tree_count: Option<u32>) -> f64 {
    let Some(canopy) = canopy_pct else {
        return 0.0;
    };
    let Some(count) = street_tree_count else {
        return 0.0;
    };
    if canopy >= 10.0 || count == 0 {
        return 0.0;
    }
    f64::from(count.min(STREET_TREE_FULL_COUNT)) / f64::from(STREET_TREE_FULL_COUNT)
        * STREET_TREE_CAP
}

/// Green-view index scaled into an 8-point bonus.
///
/// Satellite greenness signals are blended when present; otherwise a
/// composite of canopy, street-tree, and development proxies stands in.
fn greenery_bonus(
    signals: Option<&GreenerySignals>,
    canopy_pct: Option<f64>,
    street_tree_count: Option<u32>,
    landcover: &LandCover,
    area_type: AreaType,
    config: &ScoringConfig,
) -> f64 {
    let index = signals.map_or_else(
        || {
            let canopy = canopy_pct.map_or(0.0, |c| (c / 60.0).min(1.0));
            let street = street_tree_count.map_or(0.0, |n| f64::from(n.min(40)) / 40.0);
            let open = 1.0 - (landcover.developed_pct / 100.0).min(1.0);
            canopy * 0.55 + street * 0.20 + open * 0.25
        },
        |s| {
            s.canopy_visibility.clamp(0.0, 1.0) * 0.35
                + s.green_space_ratio.clamp(0.0, 1.0) * 0.25
                + s.vegetation_health.clamp(0.0, 1.0) * 0.25
                + (1.0 - s.seasonal_variance.clamp(0.0, 1.0)) * 0.15
        },
    );

    (index * GREENERY_CAP * config.greenery_multiplier_for(area_type)).clamp(0.0, GREENERY_CAP)
}

/// Shannon entropy over the four natural cover classes, normalized by the
/// maximum possible entropy for the number of non-zero classes, scaled to
/// a 4-point cap.
fn biodiversity_bonus(landcover: &LandCover) -> f64 {
    let classes = [
        landcover.forest_pct,
        landcover.wetland_pct,
        landcover.shrub_pct,
        landcover.grass_pct,
    ];
    let total: f64 = classes.iter().filter(|c| **c > 0.0).sum();
    let nonzero = classes.iter().filter(|c| **c > 0.0).count();
    if nonzero < 2 || total <= 0.0 {
        return 0.0;
    }

    let entropy: f64 = classes
        .iter()
        .filter(|c| **c > 0.0)
        .map(|c| {
            let p = c / total;
            -p * p.ln()
        })
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let max_entropy = (nonzero as f64).ln();
    (entropy / max_entropy * BIODIVERSITY_CAP).clamp(0.0, BIODIVERSITY_CAP)
}

/// Bonus for beating the climate-adjusted expectation, penalty for
/// falling clearly short; the band between is neutral.
fn expectation_adjustment(canopy_pct: f64, expectation_pct: f64, area_scaler: f64) -> (f64, f64) {
    if expectation_pct <= 0.0 {
        return (0.0, 0.0);
    }
    let ratio = canopy_pct / expectation_pct;

    if ratio >= EXPECTATION_BONUS_RATIO {
        let bonus = ((ratio - 1.0) * EXPECTATION_SLOPE * area_scaler).min(EXPECTATION_CAP);
        (bonus, 0.0)
    } else if ratio <= EXPECTATION_PENALTY_RATIO {
        let penalty = ((1.0 - ratio) * EXPECTATION_SLOPE * area_scaler).min(EXPECTATION_CAP);
        (0.0, penalty)
    } else {
        (0.0, 0.0)
    }
}
