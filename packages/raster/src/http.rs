//! HTTP-backed raster source for self-hosted zonal-statistics services.
//!
//! The service exposes a `POST /query` endpoint that accepts a serialized
//! [`RasterQuery`] and answers with a JSON body shaped like
//! `{"kind": "scalar", "value": 12.5}`,
//! `{"kind": "stats", "min": .., "max": .., "mean": .., "percentile": ..}`,
//! or `{"kind": "histogram", "counts": {"10": 123, ..}}`.
//!
//! One request per query, no retries: a source that fails or times out is
//! simply unavailable for this scoring request, and the estimator's
//! fallback chain owns what happens next.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::{RasterError, RasterQuery, RasterSource, RasterValue};

/// A raster source reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRasterSource {
    id: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpRasterSource {
    /// Creates a source with the given identifier and service base URL.
    #[must_use]
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl RasterSource for HttpRasterSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn query(
        &self,
        query: &RasterQuery,
        deadline: Duration,
    ) -> Result<RasterValue, RasterError> {
        let url = format!("{}/query", self.base_url);

        let result = self
            .client
            .post(&url)
            .timeout(deadline)
            .json(query)
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                return Err(RasterError::QueryTimeout {
                    source_id: self.id.clone(),
                    deadline,
                });
            }
            Err(e) => return Err(RasterError::Http(e)),
        };

        // 404 and 204 both mean "the product has no pixels here".
        if resp.status() == reqwest::StatusCode::NOT_FOUND
            || resp.status() == reqwest::StatusCode::NO_CONTENT
        {
            return Err(RasterError::DataUnavailable {
                source_id: self.id.clone(),
            });
        }

        if !resp.status().is_success() {
            return Err(RasterError::Malformed {
                source_id: self.id.clone(),
                message: format!("service returned status {}", resp.status()),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&self.id, &body)
    }
}

/// Parses a zonal-statistics response body into a [`RasterValue`].
fn parse_response(source_id: &str, body: &serde_json::Value) -> Result<RasterValue, RasterError> {
    let kind = body
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| RasterError::Malformed {
            source_id: source_id.to_string(),
            message: "response missing 'kind'".to_string(),
        })?;

    match kind {
        "scalar" => {
            let value = require_finite(source_id, body, "value")?;
            Ok(RasterValue::Scalar { value })
        }
        "stats" => Ok(RasterValue::Stats {
            min: require_finite(source_id, body, "min")?,
            max: require_finite(source_id, body, "max")?,
            mean: require_finite(source_id, body, "mean")?,
            percentile: body.get("percentile").and_then(serde_json::Value::as_f64),
        }),
        "histogram" => {
            let counts_obj = body
                .get("counts")
                .and_then(serde_json::Value::as_object)
                .ok_or_else(|| RasterError::Malformed {
                    source_id: source_id.to_string(),
                    message: "histogram response missing 'counts' object".to_string(),
                })?;

            let mut counts = BTreeMap::new();
            for (class_str, count_value) in counts_obj {
                let Ok(class) = class_str.parse::<u16>() else {
                    log::warn!("{source_id}: skipping non-numeric histogram class '{class_str}'");
                    continue;
                };
                let Some(count) = count_value.as_u64() else {
                    return Err(RasterError::Malformed {
                        source_id: source_id.to_string(),
                        message: format!("histogram count for class {class} is not a u64"),
                    });
                };
                counts.insert(class, count);
            }
            Ok(RasterValue::Histogram { counts })
        }
        other => Err(RasterError::Malformed {
            source_id: source_id.to_string(),
            message: format!("unknown response kind '{other}'"),
        }),
    }
}

/// Extracts a required finite f64 field from the response body.
fn require_finite(
    source_id: &str,
    body: &serde_json::Value,
    field: &str,
) -> Result<f64, RasterError> {
    let value = body
        .get(field)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| RasterError::Malformed {
            source_id: source_id.to_string(),
            message: format!("response missing numeric '{field}'"),
        })?;
    if !value.is_finite() {
        return Err(RasterError::Malformed {
            source_id: source_id.to_string(),
            message: format!("'{field}' is not finite"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_response() {
        let body = serde_json::json!({"kind": "scalar", "value": 37.25});
        let value = parse_response("tcc", &body).unwrap();
        assert!((value.as_scalar().unwrap() - 37.25).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_stats_response() {
        let body = serde_json::json!({
            "kind": "stats", "min": 0.0, "max": 88.0, "mean": 41.5, "percentile": 80.0
        });
        match parse_response("tcc", &body).unwrap() {
            RasterValue::Stats {
                mean, percentile, ..
            } => {
                assert!((mean - 41.5).abs() < f64::EPSILON);
                assert!((percentile.unwrap() - 80.0).abs() < f64::EPSILON);
            }
            other => panic!("expected stats, got {other:?}"),
        }
    }

    #[test]
    fn parses_histogram_response() {
        let body = serde_json::json!({
            "kind": "histogram",
            "counts": {"10": 600, "30": 250, "50": 150}
        });
        let value = parse_response("worldcover", &body).unwrap();
        let fraction = value.class_fraction(&[10]).unwrap();
        assert!((fraction - 0.6).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_finite_scalar() {
        let body = serde_json::json!({"kind": "scalar", "value": "oops"});
        assert!(matches!(
            parse_response("tcc", &body),
            Err(RasterError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let body = serde_json::json!({"kind": "vector"});
        assert!(matches!(
            parse_response("tcc", &body),
            Err(RasterError::Malformed { .. })
        ));
    }
}
