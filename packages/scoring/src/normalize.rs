//! Composite normalization to the final 0-100 score.
//!
//! The native scale is roughly 0-50 tree points plus a 0-20 natural
//! bonus; doubling maps it onto 0-100. Area-type parameters then shift,
//! scale, and cap the result so that scores are comparable *within* a
//! built-form class rather than across all of them — a decent courtyard
//! garden should be able to score well against other downtown blocks
//! without ever outranking a national forest.

use crate::config::NormalizationParams;
use crate::context::CONTEXT_CAP;

/// The normalized composite, kept as separate fields for the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedScore {
    /// `min(20, scenic + context)`.
    pub natural_bonus_scaled: f64,
    /// Pre-normalization score on the 0-100 scale.
    pub raw_score: f64,
    /// Final score, always in [0, 100].
    pub final_score: f64,
}

/// Combines the tree score and natural bonus, then applies area-type
/// normalization. Output is in [0, 100] for any inputs, including
/// adversarial parameters (negative shift, scale above 1).
#[must_use]
pub fn normalize(
    tree_score: f64,
    scenic_bonus: f64,
    context_total: f64,
    params: Option<NormalizationParams>,
) -> NormalizedScore {
    let natural_bonus_scaled = (scenic_bonus + context_total).min(CONTEXT_CAP);
    let raw_score = ((tree_score + natural_bonus_scaled) * 2.0).clamp(0.0, 100.0);

    let final_score = params.map_or(raw_score, |p| {
        p.max.min(raw_score * p.scale + p.shift).clamp(0.0, 100.0)
    });

    NormalizedScore {
        natural_bonus_scaled,
        raw_score,
        final_score,
    }
}
