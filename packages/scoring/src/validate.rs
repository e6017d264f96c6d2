//! Post-hoc sanity checks on a finished score.
//!
//! Everything here is non-fatal: warnings ride along on the breakdown so
//! the outer aggregator (or an operator reading logs) can discount or
//! investigate, but a questionable score is still a score.

use beauty_map_scoring_models::{ContextBonus, ValidationWarning};

use crate::context::CONTEXT_CAP;

/// Scores above this (or below its mirror) usually mean bad input data.
const EXTREME_HIGH: f64 = 95.0;
const EXTREME_LOW: f64 = 5.0;
/// Dominance share the validator flags when the guard is off.
const DOMINANCE_SHARE: f64 = 0.6;

/// Inspects a finished score and returns any warnings, in detection
/// order.
#[must_use]
pub fn validate(
    final_score: f64,
    context: &ContextBonus,
    canopy_pct: Option<f64>,
    no_satellite_data: bool,
    guard_enabled: bool,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if !(EXTREME_LOW..=EXTREME_HIGH).contains(&final_score) {
        warnings.push(ValidationWarning::ExtremeScore { score: final_score });
    }

    // The aggregator caps the bonus itself, so exceeding the cap by more
    // than 10% can only mean a calculation bug crept in.
    if context.total > CONTEXT_CAP * 1.1 {
        warnings.push(ValidationWarning::ContextCapExceeded {
            bonus: context.total,
            cap: CONTEXT_CAP,
        });
    }

    if !guard_enabled
        && let Some((component, share)) = context.dominant_share()
        && share > DOMINANCE_SHARE
    {
        warnings.push(ValidationWarning::ComponentDominance {
            component: component.to_string(),
            share,
        });
    }

    if let Some(canopy) = canopy_pct
        && canopy < 0.0
    {
        warnings.push(ValidationWarning::NegativeCanopy { value: canopy });
    }

    if no_satellite_data {
        warnings.push(ValidationWarning::NoSatelliteData);
    }

    for warning in &warnings {
        log::warn!("score validation: {warning}");
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(topography: f64, landcover: f64, water: f64) -> ContextBonus {
        let raw_total = topography + landcover + water;
        ContextBonus {
            topography_pts: topography,
            landcover_pts: landcover,
            water_pts: water,
            raw_total,
            total: raw_total.min(CONTEXT_CAP),
            guard_applied: false,
        }
    }

    #[test]
    fn clean_score_produces_no_warnings() {
        let warnings = validate(62.0, &context(4.0, 3.0, 5.0), Some(30.0), false, false);
        assert!(warnings.is_empty());
    }

    #[test]
    fn extreme_scores_are_flagged() {
        assert!(matches!(
            validate(97.0, &context(4.0, 3.0, 5.0), Some(30.0), false, false)[0],
            ValidationWarning::ExtremeScore { .. }
        ));
        assert!(matches!(
            validate(2.0, &context(1.0, 1.0, 1.0), Some(1.0), false, false)[0],
            ValidationWarning::ExtremeScore { .. }
        ));
    }

    #[test]
    fn dominance_is_flagged_only_when_guard_is_off() {
        let dominated = context(0.5, 0.5, 9.0);
        let with_guard_off = validate(50.0, &dominated, Some(20.0), false, false);
        assert!(
            with_guard_off
                .iter()
                .any(|w| matches!(w, ValidationWarning::ComponentDominance { .. }))
        );

        let with_guard_on = validate(50.0, &dominated, Some(20.0), false, true);
        assert!(
            !with_guard_on
                .iter()
                .any(|w| matches!(w, ValidationWarning::ComponentDominance { .. }))
        );
    }

    #[test]
    fn negative_canopy_is_flagged() {
        let warnings = validate(40.0, &context(2.0, 2.0, 2.0), Some(-3.0), false, false);
        assert!(matches!(
            warnings[0],
            ValidationWarning::NegativeCanopy { .. }
        ));
    }

    #[test]
    fn missing_satellite_data_is_surfaced() {
        let warnings = validate(40.0, &context(2.0, 2.0, 2.0), None, true, false);
        assert_eq!(warnings, vec![ValidationWarning::NoSatelliteData]);
    }
}
