//! The scoring pipeline: one request in, one full breakdown out.
//!
//! Scoring never fails. Missing satellite data, an empty viewpoint list,
//! an unknown area type — every degraded input takes a defined path
//! through the components and lands in the breakdown with the
//! appropriate flags and warnings, never as an `Err`.

use std::sync::Arc;

use beauty_map_canopy::CanopyEstimator;
use beauty_map_climate::classify;
use beauty_map_geo_models::{AreaType, GeoPoint};
use beauty_map_scoring_models::{ContextMetrics, GreenerySignals, ScoreBreakdown, Viewpoint};

use crate::config::ScoringConfig;
use crate::context::context_bonus;
use crate::normalize::normalize;
use crate::scenic::scenic_bonus;
use crate::streets::StreetTreeProvider;
use crate::tree::compose;
use crate::validate::validate;

/// Everything the pipeline needs to score one location.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    /// Location being scored.
    pub point: GeoPoint,
    /// Built-form classification of the surrounding area.
    pub area_type: AreaType,
    /// Elevation in meters, if known. Feeds the climate multiplier.
    pub elevation_m: Option<f64>,
    /// Analysis radius in meters.
    pub radius_m: f64,
    /// Terrain and land-cover measurements around the point.
    pub metrics: ContextMetrics,
    /// Designated scenic viewpoints within the radius.
    pub viewpoints: Vec<Viewpoint>,
    /// Street-level greenery signals, when imagery coverage exists.
    pub greenery: Option<GreenerySignals>,
}

/// Scores locations by fusing canopy, terrain, land-cover, and water
/// signals into one 0-100 composite.
pub struct BeautyScorer {
    canopy: Arc<CanopyEstimator>,
    street_trees: Arc<dyn StreetTreeProvider>,
    config: ScoringConfig,
}

impl BeautyScorer {
    /// Creates a scorer over the given collaborators.
    #[must_use]
    pub fn new(
        canopy: Arc<CanopyEstimator>,
        street_trees: Arc<dyn StreetTreeProvider>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            canopy,
            street_trees,
            config,
        }
    }

    /// Scores one location.
    ///
    /// The canopy fan-out runs under its own deadlines; everything after
    /// it is synchronous arithmetic. Input metrics are sanitized before
    /// use, so callers may pass raster output straight through.
    pub async fn score(&self, request: &ScoreRequest) -> ScoreBreakdown {
        let metrics = request.metrics.sanitized();
        let climate = classify(request.point, request.elevation_m);

        log::debug!(
            "scoring ({:.4}, {:.4}) as {} in {} climate (x{:.2})",
            request.point.lat(),
            request.point.lon(),
            request.area_type,
            climate.zone,
            climate.multiplier,
        );

        let canopy = self
            .canopy
            .estimate(request.point, request.radius_m, Some(request.area_type))
            .await;

        let street_tree_count = if self.street_trees.has_data(request.point) {
            self.street_trees
                .street_tree_count(request.point, request.radius_m)
                .await
        } else {
            None
        };

        let tree = compose(
            canopy.canopy_pct,
            street_tree_count,
            request.greenery.as_ref(),
            &metrics.landcover,
            &climate,
            request.area_type,
            &self.config,
        );

        let context = context_bonus(&metrics, &climate, request.area_type, &self.config);

        let (scenic_raw, scenic_deduped) = scenic_bonus(
            &request.viewpoints,
            request.radius_m,
            context.total,
            metrics.landcover.water_pct,
        );

        let normalized = normalize(
            tree.total,
            scenic_deduped,
            context.total,
            self.config.normalization_for(request.area_type),
        );

        let no_satellite_data = canopy.provenance.no_satellite_data();
        let warnings = validate(
            normalized.final_score,
            &context,
            canopy.canopy_pct,
            no_satellite_data,
            self.config.dominance_guard,
        );

        log::info!(
            "scored ({:.4}, {:.4}): {:.1} (tree {:.1}, context {:.1}, scenic {:.1}, {} warnings)",
            request.point.lat(),
            request.point.lon(),
            normalized.final_score,
            tree.total,
            context.total,
            scenic_deduped,
            warnings.len(),
        );

        ScoreBreakdown {
            area_type: request.area_type,
            climate,
            canopy,
            tree_base_score: tree.base,
            street_tree_bonus: tree.street_tree,
            greenery_bonus: tree.greenery,
            biodiversity_bonus: tree.biodiversity,
            expectation_bonus: tree.expectation_bonus,
            expectation_penalty: tree.expectation_penalty,
            tree_score: tree.total,
            context,
            scenic_bonus_raw: scenic_raw,
            scenic_bonus: scenic_deduped,
            natural_bonus_scaled: normalized.natural_bonus_scaled,
            raw_score: normalized.raw_score,
            final_score: normalized.final_score,
            no_satellite_data,
            warnings,
        }
    }
}
