//! Context-bonus aggregation: topography, land cover, and water.
//!
//! Each sub-score is computed against its own saturation points, clamped
//! to its documented cap, weighted by the area-type triple, and summed
//! into a context bonus that is hard-capped at 20 points. The water
//! sub-score is the climate-aware one: observed water is judged against
//! the climate-and-area-adjusted expectation rather than a fixed
//! threshold, so a pond in the desert outranks the same pond in a bayou.

use beauty_map_climate::ClimateContext;
use beauty_map_geo_models::AreaType;
use beauty_map_scoring_models::{ContextBonus, ContextMetrics, LandCover, Topography};

use crate::config::ScoringConfig;

/// Hard cap on the aggregated context bonus.
pub const CONTEXT_CAP: f64 = 20.0;

/// Cap on the topography sub-score.
const TOPOGRAPHY_CAP: f64 = 12.0;
/// Cap on the land-cover sub-score.
const LANDCOVER_CAP: f64 = 8.0;
/// Cap on the water sub-score.
const WATER_CAP: f64 = 40.0;

/// Relief range earning full credit, meters.
const RELIEF_FULL_CREDIT_M: f64 = 600.0;
/// Mean slope earning full credit, degrees.
const SLOPE_FULL_CREDIT_DEG: f64 = 20.0;
/// Steep-area fraction earning full credit.
const STEEP_FULL_CREDIT_FRACTION: f64 = 0.4;

/// A component exceeding this share of the raw total is dominant.
const DOMINANCE_SHARE: f64 = 0.6;
/// Share the guard rebalances a dominant component down to.
const GUARD_TARGET_SHARE: f64 = 0.55;
/// The guard's total scale-down step.
const GUARD_STEP: f64 = 0.10;

/// Aggregates the three weighted sub-scores into a capped context bonus.
#[must_use]
pub fn context_bonus(
    metrics: &ContextMetrics,
    climate: &ClimateContext,
    area_type: AreaType,
    config: &ScoringConfig,
) -> ContextBonus {
    let weights = config.weights_for(area_type);

    let topography_pts = topography_score(&metrics.topography, climate) * weights.topography;
    let landcover_pts = landcover_score(&metrics.landcover, area_type) * weights.landcover;
    let water_pts =
        water_score(&metrics.landcover, &metrics.topography, climate, area_type) * weights.water;

    let raw_total = topography_pts + landcover_pts + water_pts;

    let mut bonus = ContextBonus {
        topography_pts,
        landcover_pts,
        water_pts,
        raw_total,
        total: raw_total.min(CONTEXT_CAP),
        guard_applied: false,
    };

    if config.dominance_guard {
        apply_dominance_guard(&mut bonus);
    }

    bonus
}

/// Weighted blend of normalized relief, mean slope, and steep-area
/// fraction, boosted in arid climates where terrain carries most of the
/// visual signal.
fn topography_score(topography: &Topography, climate: &ClimateContext) -> f64 {
    let relief = (topography.relief_range_m / RELIEF_FULL_CREDIT_M).min(1.0);
    let slope = (topography.slope_mean_deg / SLOPE_FULL_CREDIT_DEG).min(1.0);
    let steep = (topography.steep_fraction / STEEP_FULL_CREDIT_FRACTION).min(1.0);

    let mut points = (relief * 0.5 + slope * 0.3 + steep * 0.2) * TOPOGRAPHY_CAP;
    if climate.zone.is_arid() {
        points *= 1.3;
    }
    points.min(TOPOGRAPHY_CAP)
}

/// Natural-cover index discounted by development, uplifted where natural
/// cover is the norm.
fn landcover_score(landcover: &LandCover, area_type: AreaType) -> f64 {
    let natural = (landcover.forest_pct / 60.0).min(1.0) * 0.6
        + (landcover.wetland_pct / 20.0).min(1.0) * 0.2
        + (landcover.shrub_pct / 30.0).min(1.0) * 0.1
        + (landcover.grass_pct / 40.0).min(1.0) * 0.1;

    let development_factor = (1.0 - (landcover.developed_pct / 100.0) * 0.6).max(0.4);

    let mut points = natural * development_factor * LANDCOVER_CAP;
    if area_type.is_low_density() {
        points *= 1.15;
    }
    points.min(LANDCOVER_CAP)
}

/// Water credit relative to the climate-and-area-adjusted expectation,
/// with abundance tiers, an oasis bonus, and a visibility adjustment.
fn water_score(
    landcover: &LandCover,
    topography: &Topography,
    climate: &ClimateContext,
    area_type: AreaType,
) -> f64 {
    let observed = landcover.water_pct;
    let expected = climate.water_expectation_pct(area_type);
    let ratio = observed / expected;

    // Up to 2x credit for water beyond the regional norm.
    let mut points = ratio.min(2.0) * 10.0;

    // Absolute abundance tiers.
    if observed > 25.0 {
        points += 8.0;
    } else if observed > 15.0 {
        points += 5.0;
    } else if observed > 5.0 {
        points += 3.0;
    }

    // Area types where shoreline is actually reachable.
    if area_type.is_low_density() {
        points += 2.0;
    } else if area_type == AreaType::Suburban {
        points += 1.0;
    }

    // Oasis effect: water at more than twice the regional expectation is
    // a rarity worth rewarding on top of the capped base credit.
    if ratio > 2.0 {
        points += 6.0;
    }

    // Relief makes water visible; heavy development hides it.
    points += (topography.relief_range_m / 200.0).min(3.0);
    if landcover.developed_pct > 60.0 {
        points -= 3.0;
    } else if landcover.developed_pct > 40.0 {
        points -= 1.5;
    }

    points.clamp(0.0, WATER_CAP)
}

/// Rebalances a dominant component toward a 55% share on a total scaled
/// down by the 10% step. Gentle by construction: the total never moves by
/// more than the step, and no component is truncated to zero.
fn apply_dominance_guard(bonus: &mut ContextBonus) {
    let Some((component, share)) = bonus.dominant_share() else {
        return;
    };
    if share <= DOMINANCE_SHARE {
        return;
    }

    let others_total = bonus.raw_total * (1.0 - share);
    let new_total = bonus.raw_total * (1.0 - GUARD_STEP);

    if others_total <= f64::EPSILON {
        // Nothing to rebalance toward; just take the step.
        log::debug!(
            "dominance guard: {component} is the only component; scaling total by {GUARD_STEP}"
        );
        bonus.topography_pts *= 1.0 - GUARD_STEP;
        bonus.landcover_pts *= 1.0 - GUARD_STEP;
        bonus.water_pts *= 1.0 - GUARD_STEP;
    } else {
        let dominant_target = new_total * GUARD_TARGET_SHARE;
        let others_scale = (new_total - dominant_target) / others_total;

        let rebalance = |name: &str, pts: f64| {
            if name == component {
                dominant_target
            } else {
                pts * others_scale
            }
        };
        bonus.topography_pts = rebalance("topography", bonus.topography_pts);
        bonus.landcover_pts = rebalance("landcover", bonus.landcover_pts);
        bonus.water_pts = rebalance("water", bonus.water_pts);

        log::debug!(
            "dominance guard: {component} at {:.0}% rebalanced to {:.0}%",
            share * 100.0,
            GUARD_TARGET_SHARE * 100.0
        );
    }

    bonus.guard_applied = true;
    bonus.total = (bonus.topography_pts + bonus.landcover_pts + bonus.water_pts).min(CONTEXT_CAP);
}

#[cfg(test)]
mod tests {
    use beauty_map_climate::ClimateZone;
    use beauty_map_scoring_models::{LandCover, Topography};

    use super::*;

    fn climate(zone: ClimateZone) -> ClimateContext {
        ClimateContext {
            zone,
            multiplier: 1.0,
            elevation_m: None,
        }
    }

    fn metrics(topography: Topography, landcover: LandCover) -> ContextMetrics {
        ContextMetrics {
            topography,
            landcover,
        }
    }

    #[test]
    fn context_bonus_never_exceeds_cap() {
        let extreme = metrics(
            Topography {
                relief_range_m: 2000.0,
                slope_mean_deg: 45.0,
                slope_max_deg: 80.0,
                steep_fraction: 0.9,
            },
            LandCover {
                forest_pct: 90.0,
                wetland_pct: 30.0,
                shrub_pct: 30.0,
                grass_pct: 40.0,
                developed_pct: 0.0,
                water_pct: 60.0,
            },
        );
        let bonus = context_bonus(
            &extreme,
            &climate(ClimateZone::Temperate),
            AreaType::Rural,
            &ScoringConfig::default(),
        );
        assert!(bonus.total <= CONTEXT_CAP);
        assert!(bonus.raw_total > bonus.total, "cap actually bit");
    }

    #[test]
    fn arid_terrain_boost_applies() {
        let hills = metrics(
            Topography {
                relief_range_m: 300.0,
                slope_mean_deg: 8.0,
                slope_max_deg: 25.0,
                steep_fraction: 0.1,
            },
            LandCover::default(),
        );
        let arid = context_bonus(
            &hills,
            &climate(ClimateZone::Arid),
            AreaType::Rural,
            &ScoringConfig::default(),
        );
        let temperate = context_bonus(
            &hills,
            &climate(ClimateZone::Temperate),
            AreaType::Rural,
            &ScoringConfig::default(),
        );
        assert!(arid.topography_pts > temperate.topography_pts);
    }

    #[test]
    fn rural_abundant_water_approaches_the_cap() {
        // Rich rural valley: 45% forest, 20% water against an 8%
        // expectation, 400m relief.
        let rich = metrics(
            Topography {
                relief_range_m: 400.0,
                slope_mean_deg: 6.0,
                slope_max_deg: 20.0,
                steep_fraction: 0.05,
            },
            LandCover {
                forest_pct: 45.0,
                wetland_pct: 2.0,
                shrub_pct: 3.0,
                grass_pct: 20.0,
                developed_pct: 3.0,
                water_pct: 20.0,
            },
        );
        let bonus = context_bonus(
            &rich,
            &climate(ClimateZone::Temperate),
            AreaType::Rural,
            &ScoringConfig::default(),
        );
        assert!(
            bonus.total > 14.0 && bonus.total <= CONTEXT_CAP,
            "expected near-cap bonus, got {}",
            bonus.total
        );
        // The oasis/rarity path fired: 20% observed vs 8% expected.
        assert!(bonus.water_pts > 10.0);
    }

    #[test]
    fn arid_urban_scenario_stays_small() {
        let sparse = metrics(
            Topography {
                relief_range_m: 50.0,
                slope_mean_deg: 1.0,
                slope_max_deg: 4.0,
                steep_fraction: 0.0,
            },
            LandCover {
                forest_pct: 4.0,
                wetland_pct: 0.0,
                shrub_pct: 10.0,
                grass_pct: 5.0,
                developed_pct: 45.0,
                water_pct: 0.4,
            },
        );
        let bonus = context_bonus(
            &sparse,
            &climate(ClimateZone::Arid),
            AreaType::UrbanResidential,
            &ScoringConfig::default(),
        );
        assert!(bonus.total < 4.0, "got {}", bonus.total);
    }

    #[test]
    fn development_discounts_landcover() {
        let forest = LandCover {
            forest_pct: 50.0,
            ..LandCover::default()
        };
        let paved = LandCover {
            forest_pct: 50.0,
            developed_pct: 80.0,
            ..LandCover::default()
        };
        let open = landcover_score(&forest, AreaType::Suburban);
        let built = landcover_score(&paved, AreaType::Suburban);
        assert!(built < open);
    }

    #[test]
    fn guard_rebalances_dominant_component() {
        let water_world = metrics(
            Topography {
                relief_range_m: 20.0,
                slope_mean_deg: 0.5,
                slope_max_deg: 2.0,
                steep_fraction: 0.0,
            },
            LandCover {
                forest_pct: 2.0,
                wetland_pct: 0.0,
                shrub_pct: 0.0,
                grass_pct: 2.0,
                developed_pct: 5.0,
                water_pct: 40.0,
            },
        );
        let ungoverned = context_bonus(
            &water_world,
            &climate(ClimateZone::Temperate),
            AreaType::Rural,
            &ScoringConfig::default(),
        );
        let (component, share) = ungoverned.dominant_share().unwrap();
        assert_eq!(component, "water");
        assert!(share > 0.9, "scenario should be water-dominated: {share}");

        let config = ScoringConfig {
            dominance_guard: true,
            ..ScoringConfig::default()
        };
        let governed = context_bonus(
            &water_world,
            &climate(ClimateZone::Temperate),
            AreaType::Rural,
            &config,
        );
        assert!(governed.guard_applied);

        let governed_sum =
            governed.topography_pts + governed.landcover_pts + governed.water_pts;
        let governed_share = governed.water_pts / governed_sum;
        assert!(
            governed_share < DOMINANCE_SHARE,
            "share still {governed_share}"
        );
        // The total moves by exactly the documented step.
        assert!((governed_sum - ungoverned.raw_total * 0.9).abs() < 1e-9);
    }

    #[test]
    fn guard_leaves_balanced_bonuses_alone() {
        let balanced = metrics(
            Topography {
                relief_range_m: 300.0,
                slope_mean_deg: 8.0,
                slope_max_deg: 20.0,
                steep_fraction: 0.1,
            },
            LandCover {
                forest_pct: 40.0,
                wetland_pct: 5.0,
                shrub_pct: 5.0,
                grass_pct: 15.0,
                developed_pct: 10.0,
                water_pct: 6.0,
            },
        );
        let config = ScoringConfig {
            dominance_guard: true,
            ..ScoringConfig::default()
        };

        let bonus = context_bonus(
            &balanced,
            &climate(ClimateZone::Temperate),
            AreaType::Suburban,
            &config,
        );
        assert!(!bonus.guard_applied);
    }
}
