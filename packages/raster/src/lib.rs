#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Bounded-region statistical queries against external raster data sources.
//!
//! A [`RasterQuery`] asks a named source for one reduction ("mean of band X
//! over a circular buffer") and gets back a scalar, a summary-stats tuple,
//! or a class histogram. The adapter is pure and stateless: one external
//! call per query, no retries. Callers own the retry/fallback policy — the
//! canopy estimator, for example, treats a failed source as "contributes
//! nothing" rather than retrying it.

pub mod http;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use beauty_map_geo_models::GeoPoint;
use serde::{Deserialize, Serialize};

/// Errors that can occur while querying a raster source.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// The source has no coverage at the requested location/time.
    #[error("source '{source_id}' has no data for the requested region")]
    DataUnavailable {
        /// Identifier of the source that lacked coverage.
        source_id: String,
    },

    /// The external service did not respond within the caller's deadline.
    #[error("source '{source_id}' timed out after {deadline:?}")]
    QueryTimeout {
        /// Identifier of the source that timed out.
        source_id: String,
        /// The deadline that was exceeded.
        deadline: Duration,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source answered with a value that makes no physical sense
    /// (NaN, negative pixel count, percentage outside [0, 100]).
    #[error("malformed measurement from '{source_id}': {message}")]
    Malformed {
        /// Identifier of the offending source.
        source_id: String,
        /// Description of what was wrong with the value.
        message: String,
    },
}

impl RasterError {
    /// Returns `true` when the failure means "this source contributes
    /// nothing" rather than "the request is broken".
    ///
    /// Timeouts and missing coverage are expected operating conditions for
    /// satellite products; malformed data and transport errors are worth a
    /// louder log line but are absorbed the same way by callers.
    #[must_use]
    pub const fn is_unavailability(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::QueryTimeout { .. }
        )
    }
}

/// Statistical reduction applied over the buffered region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "arg")]
pub enum Reducer {
    /// Mean pixel value over the buffer.
    Mean,
    /// Maximum pixel value over the buffer.
    Max,
    /// The given percentile (0-100) of pixel values over the buffer.
    Percentile(f64),
    /// Pixel counts per class value (for categorical bands).
    FrequencyHistogram,
}

/// Circular query region: a center point plus a radius in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferRegion {
    /// Center of the buffer.
    pub center: GeoPoint,
    /// Buffer radius in meters.
    pub radius_m: f64,
}

/// A single bounded-region statistical query.
///
/// Created per call and discarded; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterQuery {
    /// Identifier of the raster product to query (e.g. a tiled canopy
    /// product or a global land-cover classifier).
    pub source_id: String,
    /// Band or asset name within the product.
    pub band: String,
    /// Circular region to reduce over.
    pub buffer: BufferRegion,
    /// Requested spatial resolution in meters per pixel.
    pub scale_m: f64,
    /// Reduction to apply.
    pub reducer: Reducer,
}

/// Result of a raster query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RasterValue {
    /// A single reduced value (mean, max, or percentile).
    Scalar {
        /// The reduced value.
        value: f64,
    },
    /// Summary statistics over the buffer.
    Stats {
        /// Minimum pixel value.
        min: f64,
        /// Maximum pixel value.
        max: f64,
        /// Mean pixel value.
        mean: f64,
        /// Requested percentile value, if one was asked for.
        percentile: Option<f64>,
    },
    /// Class value to pixel count, for categorical bands.
    Histogram {
        /// Pixel counts keyed by class value.
        counts: BTreeMap<u16, u64>,
    },
}

impl RasterValue {
    /// Extracts a scalar from the result, preferring the mean for stats
    /// tuples. Histograms have no scalar form.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar { value } => Some(*value),
            Self::Stats { mean, .. } => Some(*mean),
            Self::Histogram { .. } => None,
        }
    }

    /// For a histogram result, the fraction (0-1) of pixels whose class is
    /// in `classes`. Returns `None` for non-histogram results or an empty
    /// histogram.
    #[must_use]
    pub fn class_fraction(&self, classes: &[u16]) -> Option<f64> {
        let Self::Histogram { counts } = self else {
            return None;
        };
        let total: u64 = counts.values().sum();
        if total == 0 {
            return None;
        }
        let matching: u64 = counts
            .iter()
            .filter(|(class, _)| classes.contains(class))
            .map(|(_, count)| *count)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        Some(matching as f64 / total as f64)
    }
}

/// Trait that all raster data sources implement.
///
/// One implementation per external product/service. Implementations issue
/// exactly one external call per query and must honor `deadline`; they
/// never retry.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g. `"nlcd_tcc"`).
    fn id(&self) -> &str;

    /// Runs one bounded-region statistical query.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::DataUnavailable`] when the product has no
    /// coverage for the buffer, [`RasterError::QueryTimeout`] when the
    /// service misses `deadline`, and transport/decode variants otherwise.
    async fn query(
        &self,
        query: &RasterQuery,
        deadline: Duration,
    ) -> Result<RasterValue, RasterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(pairs: &[(u16, u64)]) -> RasterValue {
        RasterValue::Histogram {
            counts: pairs.iter().copied().collect(),
        }
    }

    #[test]
    fn scalar_extraction_prefers_mean_for_stats() {
        let stats = RasterValue::Stats {
            min: 1.0,
            max: 9.0,
            mean: 4.5,
            percentile: Some(8.0),
        };
        assert!((stats.as_scalar().unwrap() - 4.5).abs() < f64::EPSILON);

        let scalar = RasterValue::Scalar { value: 2.0 };
        assert!((scalar.as_scalar().unwrap() - 2.0).abs() < f64::EPSILON);

        assert!(histogram(&[(1, 10)]).as_scalar().is_none());
    }

    #[test]
    fn class_fraction_sums_matching_classes() {
        let hist = histogram(&[(10, 60), (20, 30), (30, 10)]);
        let fraction = hist.class_fraction(&[10, 30]).unwrap();
        assert!((fraction - 0.7).abs() < 1e-9);
    }

    #[test]
    fn class_fraction_rejects_empty_and_non_histogram() {
        assert!(histogram(&[]).class_fraction(&[10]).is_none());
        let scalar = RasterValue::Scalar { value: 1.0 };
        assert!(scalar.class_fraction(&[10]).is_none());
    }

    #[test]
    fn unavailability_classification() {
        assert!(
            RasterError::DataUnavailable {
                source_id: "x".to_string(),
            }
            .is_unavailability()
        );
        assert!(
            RasterError::QueryTimeout {
                source_id: "x".to_string(),
                deadline: Duration::from_secs(8),
            }
            .is_unavailability()
        );
        assert!(
            !RasterError::Malformed {
                source_id: "x".to_string(),
                message: "NaN mean".to_string(),
            }
            .is_unavailability()
        );
    }
}
