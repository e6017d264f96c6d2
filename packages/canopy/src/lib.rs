#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Multi-source tree canopy estimation.
//!
//! Three independent satellite products measure the same physical quantity
//! (fraction of ground covered by tree crown) with different biases and
//! different coverage gaps. The estimator queries all three concurrently
//! under per-source and collection-wide deadlines, then reconciles whatever
//! came back into one canopy percentage plus typed provenance. A source
//! that fails or times out contributes nothing; only total failure
//! surfaces to the caller (as a `None` canopy, never as an error).

pub mod reconcile;
pub mod sources;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beauty_map_geo_models::{AreaType, GeoPoint};
use beauty_map_raster::RasterError;
use futures::StreamExt as _;
use serde::{Deserialize, Serialize};

use crate::reconcile::{SourceReading, reconcile};

/// How a source's measurement is treated during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Treated as ground truth, compensated for known downward bias.
    Primary,
    /// Used to cross-check (and possibly raise) the primary value, or as
    /// fallback when the primary has no coverage.
    Validation,
}

/// Trait that all canopy data sources implement.
///
/// One implementation per satellite product. Implementations must honor
/// `deadline` on their external call; the estimator additionally abandons
/// any source that overruns it.
#[async_trait]
pub trait CanopySource: Send + Sync {
    /// Unique identifier, used in provenance and logs.
    fn id(&self) -> &str;

    /// Whether this source is the primary measurement or a validator.
    fn role(&self) -> SourceRole;

    /// Measures canopy percentage over a circular buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] when the product has no coverage, misses the
    /// deadline, or answers with something unusable.
    async fn canopy_pct(
        &self,
        point: GeoPoint,
        radius_m: f64,
        deadline: Duration,
    ) -> Result<f64, RasterError>;
}

/// Where a canopy estimate came from and how much the sources agreed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanopyProvenance {
    /// Identifier of the primary source, when it answered.
    pub primary_source: Option<String>,
    /// Sources whose value influenced the final number.
    pub contributing_sources: Vec<String>,
    /// Agreement/disagreement and escalation notes, one per comparison.
    pub notes: Vec<String>,
    /// Sources that contributed nothing, with the reason.
    pub failed_sources: Vec<String>,
}

impl CanopyProvenance {
    /// `true` when no satellite product had data at all. Downstream
    /// consumers should discount confidence rather than read the estimate
    /// as "zero canopy".
    #[must_use]
    pub fn no_satellite_data(&self) -> bool {
        self.contributing_sources.is_empty()
    }
}

/// Result of one canopy estimation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanopyEstimate {
    /// Reconciled canopy percentage in [0, 100]. `None` means every source
    /// was unavailable — deliberately distinct from a measured 0.0.
    pub canopy_pct: Option<f64>,
    /// The search radius the sources were queried with, in meters.
    pub radius_m: f64,
    /// Which sources contributed and how much they agreed.
    pub provenance: CanopyProvenance,
}

/// Deadlines and pool size for the concurrent fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Deadline for each individual source.
    pub per_source_timeout: Duration,
    /// Deadline for the whole collection; sources still pending at this
    /// point are abandoned.
    pub collection_timeout: Duration,
    /// Maximum number of sources queried at once.
    pub concurrency: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            per_source_timeout: Duration::from_secs(8),
            collection_timeout: Duration::from_secs(10),
            concurrency: 3,
        }
    }
}

/// Orchestrates the canopy sources and reconciles their answers.
pub struct CanopyEstimator {
    sources: Vec<Arc<dyn CanopySource>>,
    config: EstimatorConfig,
}

impl CanopyEstimator {
    /// Creates an estimator over the given sources.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn CanopySource>>, config: EstimatorConfig) -> Self {
        Self { sources, config }
    }

    /// Estimates canopy percentage over a circular buffer at `point`.
    ///
    /// `area_hint` is informational only — it shows up in logs so an
    /// operator can correlate odd estimates with the built form, but it
    /// never alters the arithmetic.
    ///
    /// Individual source failures are absorbed here (logged, recorded in
    /// provenance); the estimate is `None` only when every source failed.
    pub async fn estimate(
        &self,
        point: GeoPoint,
        radius_m: f64,
        area_hint: Option<AreaType>,
    ) -> CanopyEstimate {
        if let Some(hint) = area_hint {
            log::debug!(
                "canopy estimate for ({:.4}, {:.4}) r={radius_m}m in {hint} context",
                point.lat(),
                point.lon(),
            );
        }

        let per_source = self.config.per_source_timeout;
        let deadline = tokio::time::Instant::now() + self.config.collection_timeout;

        let mut pending = futures::stream::iter(self.sources.iter().cloned().map(|source| {
            async move {
                let id = source.id().to_string();
                let role = source.role();
                let result =
                    match tokio::time::timeout(per_source, source.canopy_pct(point, radius_m, per_source))
                        .await
                    {
                        Ok(inner) => inner,
                        Err(_) => Err(RasterError::QueryTimeout {
                            source_id: id.clone(),
                            deadline: per_source,
                        }),
                    };
                SourceReading { id, role, result }
            }
        }))
        .buffer_unordered(self.config.concurrency.max(1));

        // Completion-ordered collection under the overall deadline. A
        // source still pending when the deadline passes is abandoned; its
        // eventual result (if any) is discarded with the stream.
        let mut readings = Vec::with_capacity(self.sources.len());
        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some(reading)) => readings.push(reading),
                Ok(None) => break,
                Err(_) => {
                    log::warn!(
                        "canopy collection deadline hit with {} of {} sources answered",
                        readings.len(),
                        self.sources.len()
                    );
                    break;
                }
            }
        }
        drop(pending);

        // Sources that never completed still show up in provenance.
        for source in &self.sources {
            if !readings.iter().any(|r| r.id == source.id()) {
                readings.push(SourceReading {
                    id: source.id().to_string(),
                    role: source.role(),
                    result: Err(RasterError::QueryTimeout {
                        source_id: source.id().to_string(),
                        deadline: self.config.collection_timeout,
                    }),
                });
            }
        }

        let (canopy_pct, provenance) = reconcile(readings);

        CanopyEstimate {
            canopy_pct,
            radius_m,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSource {
        id: &'static str,
        role: SourceRole,
        value: Result<f64, ()>,
        delay: Duration,
    }

    #[async_trait]
    impl CanopySource for FakeSource {
        fn id(&self) -> &str {
            self.id
        }

        fn role(&self) -> SourceRole {
            self.role
        }

        async fn canopy_pct(
            &self,
            _point: GeoPoint,
            _radius_m: f64,
            _deadline: Duration,
        ) -> Result<f64, RasterError> {
            tokio::time::sleep(self.delay).await;
            self.value.map_err(|()| RasterError::DataUnavailable {
                source_id: self.id.to_string(),
            })
        }
    }

    fn fast(id: &'static str, role: SourceRole, value: f64) -> Arc<dyn CanopySource> {
        Arc::new(FakeSource {
            id,
            role,
            value: Ok(value),
            delay: Duration::ZERO,
        })
    }

    fn failing(id: &'static str, role: SourceRole) -> Arc<dyn CanopySource> {
        Arc::new(FakeSource {
            id,
            role,
            value: Err(()),
            delay: Duration::ZERO,
        })
    }

    fn slow(id: &'static str, role: SourceRole, value: f64) -> Arc<dyn CanopySource> {
        Arc::new(FakeSource {
            id,
            role,
            value: Ok(value),
            delay: Duration::from_millis(250),
        })
    }

    fn test_config() -> EstimatorConfig {
        EstimatorConfig {
            per_source_timeout: Duration::from_millis(50),
            collection_timeout: Duration::from_millis(80),
            concurrency: 3,
        }
    }

    fn point() -> GeoPoint {
        GeoPoint::new(45.52, -122.68).unwrap()
    }

    #[tokio::test]
    async fn reconciles_agreeing_sources_to_primary() {
        let estimator = CanopyEstimator::new(
            vec![
                fast("tiled", SourceRole::Primary, 20.0),
                fast("global", SourceRole::Validation, 23.0),
                fast("landcover", SourceRole::Validation, 18.0),
            ],
            test_config(),
        );
        let estimate = estimator.estimate(point(), 500.0, None).await;
        assert!((estimate.canopy_pct.unwrap() - 20.0).abs() < f64::EPSILON);
        assert_eq!(
            estimate.provenance.primary_source.as_deref(),
            Some("tiled")
        );
    }

    #[tokio::test]
    async fn slow_source_is_abandoned_not_fatal() {
        let estimator = CanopyEstimator::new(
            vec![
                slow("tiled", SourceRole::Primary, 55.0),
                fast("global", SourceRole::Validation, 18.0),
                fast("landcover", SourceRole::Validation, 24.0),
            ],
            test_config(),
        );
        let estimate = estimator.estimate(point(), 500.0, None).await;
        // Primary timed out, so the fallback takes the max of the
        // validators.
        assert!((estimate.canopy_pct.unwrap() - 24.0).abs() < f64::EPSILON);
        assert!(estimate.provenance.primary_source.is_none());
        assert!(
            estimate
                .provenance
                .failed_sources
                .iter()
                .any(|f| f.starts_with("tiled"))
        );
    }

    #[tokio::test]
    async fn collection_deadline_abandons_pending_sources() {
        // Generous per-source timeout so only the collection-wide
        // deadline can cut the sleeping primary off.
        let estimator = CanopyEstimator::new(
            vec![
                slow("tiled", SourceRole::Primary, 55.0),
                fast("global", SourceRole::Validation, 18.0),
                fast("landcover", SourceRole::Validation, 24.0),
            ],
            EstimatorConfig {
                per_source_timeout: Duration::from_millis(500),
                collection_timeout: Duration::from_millis(50),
                concurrency: 3,
            },
        );
        let estimate = estimator.estimate(point(), 500.0, None).await;
        assert!((estimate.canopy_pct.unwrap() - 24.0).abs() < f64::EPSILON);
        assert!(estimate.provenance.primary_source.is_none());
        assert!(
            estimate
                .provenance
                .failed_sources
                .iter()
                .any(|f| f.starts_with("tiled"))
        );
    }

    #[tokio::test]
    async fn all_sources_unavailable_yields_none() {
        let estimator = CanopyEstimator::new(
            vec![
                failing("tiled", SourceRole::Primary),
                failing("global", SourceRole::Validation),
                failing("landcover", SourceRole::Validation),
            ],
            test_config(),
        );
        let estimate = estimator.estimate(point(), 500.0, None).await;
        assert!(estimate.canopy_pct.is_none());
        assert!(estimate.provenance.no_satellite_data());
        assert_eq!(estimate.provenance.failed_sources.len(), 3);
    }

    #[tokio::test]
    async fn area_hint_does_not_alter_arithmetic() {
        let sources = || {
            vec![
                fast("tiled", SourceRole::Primary, 20.0),
                fast("global", SourceRole::Validation, 35.0),
            ]
        };
        let without = CanopyEstimator::new(sources(), test_config())
            .estimate(point(), 500.0, None)
            .await;
        let with = CanopyEstimator::new(sources(), test_config())
            .estimate(point(), 500.0, Some(AreaType::UrbanCore))
            .await;
        assert_eq!(without.canopy_pct, with.canopy_pct);
        assert_eq!(without.provenance, with.provenance);
    }

    #[tokio::test]
    async fn estimate_records_radius() {
        let estimator = CanopyEstimator::new(
            vec![fast("tiled", SourceRole::Primary, 40.0)],
            test_config(),
        );
        let estimate = estimator.estimate(point(), 800.0, None).await;
        assert!((estimate.radius_m - 800.0).abs() < f64::EPSILON);
    }
}
