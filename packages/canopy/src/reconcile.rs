//! Reconciliation of disagreeing canopy measurements.
//!
//! The primary product is treated as ground truth but is known to
//! underestimate canopy in some regions, so validation sources can only
//! ever *raise* the estimate, never lower it. When the primary has no
//! coverage the fallback takes the **maximum** of the available validation
//! values, not the mean — averaging would dilute a real signal with an
//! underestimating one. Both choices systematically bias upward; that is a
//! deliberate counter to the primary's downward bias, not a claim of
//! statistical optimality.

use beauty_map_raster::RasterError;

use crate::{CanopyProvenance, SourceRole};

/// One source's answer (or failure) for a single estimation request.
#[derive(Debug)]
pub struct SourceReading {
    /// Source identifier.
    pub id: String,
    /// Primary or validation.
    pub role: SourceRole,
    /// The measured canopy percentage, or why there is none.
    pub result: Result<f64, RasterError>,
}

/// Disagreement at or below this is strong agreement.
const STRONG_AGREEMENT_PCT: f64 = 5.0;
/// Disagreement at or below this is still acceptable.
const ACCEPTABLE_AGREEMENT_PCT: f64 = 10.0;
/// Validation values above this are capped before entering the max, so a
/// single outlier pixel cluster cannot drag the estimate to 100.
const VALIDATION_OUTLIER_CAP_PCT: f64 = 90.0;

/// Merges per-source readings into one canopy value plus provenance.
///
/// Malformed values (NaN, negative, >100) are discarded or clamped with a
/// logged warning before reconciliation. Returns `None` only when no
/// source produced a usable value.
#[must_use]
pub fn reconcile(readings: Vec<SourceReading>) -> (Option<f64>, CanopyProvenance) {
    let mut provenance = CanopyProvenance::default();
    let mut primary: Option<(String, f64)> = None;
    let mut validations: Vec<(String, f64)> = Vec::new();

    for reading in readings {
        match reading.result {
            Ok(raw) => {
                let Some(value) = sanitize(&reading.id, raw) else {
                    provenance
                        .failed_sources
                        .push(format!("{}: malformed value {raw}", reading.id));
                    continue;
                };
                match reading.role {
                    SourceRole::Primary if primary.is_none() => {
                        primary = Some((reading.id, value));
                    }
                    // A second primary is a wiring mistake; demote it
                    // rather than silently overwrite.
                    SourceRole::Primary | SourceRole::Validation => {
                        validations.push((reading.id, value));
                    }
                }
            }
            Err(e) => {
                if e.is_unavailability() {
                    log::debug!("canopy source {} unavailable: {e}", reading.id);
                } else {
                    log::warn!("canopy source {} failed: {e}", reading.id);
                }
                provenance.failed_sources.push(format!("{}: {e}", reading.id));
            }
        }
    }

    if let Some((primary_id, primary_value)) = primary {
        let value = reconcile_against_validations(
            &primary_id,
            primary_value,
            &validations,
            &mut provenance,
        );
        provenance.primary_source = Some(primary_id.clone());
        if !provenance.contributing_sources.contains(&primary_id) {
            provenance.contributing_sources.insert(0, primary_id);
        }
        return (Some(value.clamp(0.0, 100.0)), provenance);
    }

    // Fallback: max, not mean, of whatever validators answered.
    let validation_count = validations.len();
    let Some((best_id, best_value)) = validations
        .into_iter()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
    else {
        provenance
            .notes
            .push("no satellite data available".to_string());
        return (None, provenance);
    };
    provenance.notes.push(format!(
        "primary unavailable; using max of {validation_count} validation source(s)"
    ));
    provenance.contributing_sources.push(best_id);
    (Some(best_value.clamp(0.0, 100.0)), provenance)
}

/// Applies the agreement bands and upward escalation.
fn reconcile_against_validations(
    primary_id: &str,
    primary_value: f64,
    validations: &[(String, f64)],
    provenance: &mut CanopyProvenance,
) -> f64 {
    let mut value = primary_value;

    for (validation_id, validation_value) in validations {
        let diff = (primary_value - validation_value).abs();

        if diff <= STRONG_AGREEMENT_PCT {
            provenance.notes.push(format!(
                "{validation_id} strongly agrees with {primary_id} (diff {diff:.1})"
            ));
        } else if diff <= ACCEPTABLE_AGREEMENT_PCT {
            provenance.notes.push(format!(
                "{validation_id} acceptably agrees with {primary_id} (diff {diff:.1})"
            ));
        } else if *validation_value > primary_value + ACCEPTABLE_AGREEMENT_PCT {
            // Evidence the primary underestimates here.
            let capped = validation_value.min(VALIDATION_OUTLIER_CAP_PCT);
            if capped > value {
                value = capped;
                provenance.notes.push(format!(
                    "{validation_id} reads {validation_value:.1} vs {primary_value:.1}; \
                     raised estimate to {capped:.1}"
                ));
                provenance
                    .contributing_sources
                    .push(validation_id.clone());
            }
        } else {
            provenance.notes.push(format!(
                "{validation_id} reads {validation_value:.1}, far below {primary_id} \
                 ({primary_value:.1}); kept primary"
            ));
        }
    }

    value
}

/// Discards NaN and clamps out-of-range percentages, warning either way.
fn sanitize(source_id: &str, raw: f64) -> Option<f64> {
    if raw.is_nan() {
        log::warn!("{source_id}: discarding NaN canopy value");
        return None;
    }
    if raw < 0.0 {
        log::warn!("{source_id}: discarding negative canopy value {raw}");
        return None;
    }
    if raw > 100.0 {
        log::warn!("{source_id}: clamping canopy value {raw} to 100");
        return Some(100.0);
    }
    Some(raw)
}
