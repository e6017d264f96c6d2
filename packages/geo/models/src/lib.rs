#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate and area-type primitives shared across the scoring engine.
//!
//! Every component of the natural-beauty pipeline operates on a validated
//! [`GeoPoint`] and an externally supplied [`AreaType`]. Area-type
//! classification itself (from building footprints and density) is not
//! this system's job; the label arrives as an input and drives weight-table
//! lookups throughout scoring.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A validated WGS84 coordinate.
///
/// Latitude is checked against [-90, 90]; longitude is normalized into
/// (-180, 180] so that antimeridian-wrapped inputs (e.g. 190°) compare
/// consistently in the longitude-band climate tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a point, validating latitude and normalizing longitude.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if the latitude is outside
    /// [-90, 90] or either component is not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidCoordinateError { lat, lon });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinateError { lat, lon });
        }
        Ok(Self {
            lat,
            lon: normalize_lon(lon),
        })
    }

    /// Latitude in degrees, guaranteed within [-90, 90].
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees, guaranteed within (-180, 180].
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }
}

/// Wraps a longitude into (-180, 180].
fn normalize_lon(lon: f64) -> f64 {
    let mut wrapped = lon % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    } else if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Error returned when constructing a [`GeoPoint`] from invalid components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinateError {
    /// The latitude that was provided.
    pub lat: f64,
    /// The longitude that was provided.
    pub lon: f64,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinate ({}, {}): latitude must be finite and within [-90, 90]",
            self.lat, self.lon
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// Built-form context label for a location.
///
/// Supplied by an external area-type classifier; selects the weight,
/// expectation, and normalization tables used throughout scoring. An
/// unrecognized or missing classification maps to [`Self::Unknown`], which
/// gets neutral weights and pass-through normalization.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AreaType {
    /// Dense high-rise urban core.
    UrbanCore,
    /// Dense urban core without high-rise built form.
    UrbanCoreLowrise,
    /// Pre-war dense urban fabric.
    HistoricUrban,
    /// Urban residential neighborhoods.
    UrbanResidential,
    /// Postwar suburban fabric.
    Suburban,
    /// Low-density edge development.
    Exurban,
    /// Agricultural and undeveloped land.
    Rural,
    /// Classifier had no answer; neutral tables apply.
    Unknown,
}

impl AreaType {
    /// Returns `true` for the low-density area types where natural land
    /// cover is the norm rather than the exception.
    #[must_use]
    pub const fn is_low_density(self) -> bool {
        matches!(self, Self::Rural | Self::Exurban)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn accepts_valid_coordinates() {
        let p = GeoPoint::new(41.8781, -87.6298).unwrap();
        assert!((p.lat() - 41.8781).abs() < f64::EPSILON);
        assert!((p.lon() - -87.6298).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(GeoPoint::new(90.1, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
    }

    #[test]
    fn rejects_non_finite_components() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn normalizes_wrapped_longitude() {
        let p = GeoPoint::new(0.0, 190.0).unwrap();
        assert!((p.lon() - -170.0).abs() < 1e-9);

        let p = GeoPoint::new(0.0, -180.0).unwrap();
        assert!((p.lon() - 180.0).abs() < 1e-9);

        let p = GeoPoint::new(0.0, 540.0).unwrap();
        assert!((p.lon() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn area_type_round_trips_through_snake_case() {
        assert_eq!(AreaType::UrbanCore.to_string(), "urban_core");
        assert_eq!(
            AreaType::from_str("urban_residential").unwrap(),
            AreaType::UrbanResidential
        );
        assert!(AreaType::from_str("floating_city").is_err());
    }

    #[test]
    fn low_density_covers_rural_and_exurban_only() {
        assert!(AreaType::Rural.is_low_density());
        assert!(AreaType::Exurban.is_low_density());
        assert!(!AreaType::Suburban.is_low_density());
        assert!(!AreaType::UrbanCore.is_low_density());
    }
}
