//! Viewpoint bonus with double-counting discounts.
//!
//! A viewpoint near a lake is usually beautiful *because of the lake*,
//! and the lake already earned points through the water sub-score. The
//! deduplication discount keeps the scenic bonus from paying for the same
//! view twice: a large context bonus discounts it first, and failing
//! that, visible water coverage does.

use beauty_map_scoring_models::Viewpoint;

/// Cap on the scenic bonus, before and after deduplication.
pub const SCENIC_CAP: f64 = 6.0;

/// Points one viewpoint at zero distance is worth.
const POINTS_PER_VIEWPOINT: f64 = 3.0;
/// Floor on a viewpoint's distance weight; even a far viewpoint inside
/// the query radius counts a little.
const MIN_VIEWPOINT_WEIGHT: f64 = 0.05;

/// Context bonus above which the context discount kicks in.
const CONTEXT_DISCOUNT_THRESHOLD: f64 = 8.0;
/// Water coverage above which the water discount kicks in.
const WATER_DISCOUNT_THRESHOLD_PCT: f64 = 10.0;

/// Computes the raw and deduplicated scenic bonus.
///
/// Raw bonus is `min(6, sum(max(0.05, 1 - d/radius) * 3))`. The dedup
/// factor is `max(0.6, 1 - (context/20)*0.4)` when the context bonus
/// exceeds 8, else `max(0.7, 1 - (water/50)*0.3)` when water coverage
/// exceeds 10%, else 1.
#[must_use]
pub fn scenic_bonus(
    viewpoints: &[Viewpoint],
    radius_m: f64,
    context_total: f64,
    water_pct: f64,
) -> (f64, f64) {
    if viewpoints.is_empty() || radius_m <= 0.0 {
        return (0.0, 0.0);
    }

    let raw: f64 = viewpoints
        .iter()
        .map(|viewpoint| {
            let weight = (1.0 - viewpoint.distance_m.max(0.0) / radius_m).max(MIN_VIEWPOINT_WEIGHT);
            weight * POINTS_PER_VIEWPOINT
        })
        .sum::<f64>()
        .min(SCENIC_CAP);

    let factor = if context_total > CONTEXT_DISCOUNT_THRESHOLD {
        (1.0 - (context_total / 20.0) * 0.4).max(0.6)
    } else if water_pct > WATER_DISCOUNT_THRESHOLD_PCT {
        (1.0 - (water_pct / 50.0) * 0.3).max(0.7)
    } else {
        1.0
    };

    (raw, raw * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewpoint(distance_m: f64) -> Viewpoint {
        Viewpoint {
            name: None,
            distance_m,
        }
    }

    #[test]
    fn no_viewpoints_no_bonus() {
        let (raw, deduped) = scenic_bonus(&[], 1000.0, 0.0, 0.0);
        assert!(raw.abs() < f64::EPSILON && deduped.abs() < f64::EPSILON);
    }

    #[test]
    fn close_viewpoints_earn_more() {
        let (close, _) = scenic_bonus(&[viewpoint(100.0)], 1000.0, 0.0, 0.0);
        let (far, _) = scenic_bonus(&[viewpoint(900.0)], 1000.0, 0.0, 0.0);
        assert!(close > far);
        assert!((close - 2.7).abs() < 1e-9);
    }

    #[test]
    fn distant_viewpoints_keep_the_floor_weight() {
        let (raw, _) = scenic_bonus(&[viewpoint(5000.0)], 1000.0, 0.0, 0.0);
        assert!((raw - 0.15).abs() < 1e-9);
    }

    #[test]
    fn bonus_caps_at_six() {
        let many: Vec<Viewpoint> = (0..10).map(|_| viewpoint(0.0)).collect();
        let (raw, deduped) = scenic_bonus(&many, 1000.0, 0.0, 0.0);
        assert!((raw - SCENIC_CAP).abs() < f64::EPSILON);
        assert!(deduped <= SCENIC_CAP);
    }

    #[test]
    fn high_context_bonus_discounts() {
        let (raw, deduped) = scenic_bonus(&[viewpoint(0.0)], 1000.0, 18.0, 0.0);
        assert!((raw - 3.0).abs() < f64::EPSILON);
        // factor = 1 - (18/20)*0.4 = 0.64
        assert!((deduped - 3.0 * 0.64).abs() < 1e-9);
    }

    #[test]
    fn context_discount_floors_at_sixty_percent() {
        // At the 20-point context cap the factor bottoms out at exactly
        // the 0.6 floor.
        let (_, at_cap) = scenic_bonus(&[viewpoint(0.0)], 1000.0, 20.0, 0.0);
        assert!((at_cap - 1.8).abs() < 1e-9);

        // An over-cap context (unfloored factor 0.2) is still held at 0.6.
        let (_, over_cap) = scenic_bonus(&[viewpoint(0.0)], 1000.0, 40.0, 0.0);
        assert!((over_cap - 1.8).abs() < 1e-9);
    }

    #[test]
    fn water_discount_applies_without_context() {
        let (_, deduped) = scenic_bonus(&[viewpoint(0.0)], 1000.0, 4.0, 20.0);
        // factor = 1 - (20/50)*0.3 = 0.88
        assert!((deduped - 3.0 * 0.88).abs() < 1e-9);
    }

    #[test]
    fn context_discount_wins_over_water() {
        let (_, with_both) = scenic_bonus(&[viewpoint(0.0)], 1000.0, 12.0, 40.0);
        // Only the context factor applies: 1 - (12/20)*0.4 = 0.76.
        assert!((with_both - 3.0 * 0.76).abs() < 1e-9);
    }
}
