#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Climate zone classification and climate-adjusted expectations.
//!
//! Raw "percent canopy" is meaningless without a climate-appropriate
//! yardstick: 8% canopy is excellent in a desert and poor in a temperate
//! suburb. [`classify`] derives a climate zone and a dimensionless
//! multiplier from latitude/longitude/elevation via a coarse decision
//! table over latitude and longitude bands (calibrated for the
//! continental US); [`ClimateContext`] then turns the zone into canopy
//! and water-coverage expectations for a given area type.
//!
//! Everything here is pure and deterministic; no I/O, no state.

use beauty_map_geo_models::{AreaType, GeoPoint};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Discrete climate label derived from the climate multiplier.
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
pub enum ClimateZone {
    /// Desert climates; almost no natural canopy.
    Arid,
    /// Steppe and high-desert climates. Folds into [`Self::Arid`] for
    /// expectation lookups.
    SemiArid,
    /// Dry-summer coastal climates (30-40°N west coast).
    Mediterranean,
    /// Mid-latitude moderate climates.
    Temperate,
    /// Wet mid-latitude climates (eastern US, Pacific coast).
    HumidTemperate,
    /// Hot, wet climates; dense year-round vegetation.
    Tropical,
    /// High-latitude interior climates with strong seasons.
    Continental,
    /// Could not be classified; neutral expectations apply.
    Unknown,
}

impl ClimateZone {
    /// Returns `true` for the zones where vegetation is sparse and terrain
    /// carries a disproportionate share of a location's visual appeal.
    #[must_use]
    pub const fn is_arid(self) -> bool {
        matches!(self, Self::Arid | Self::SemiArid)
    }

    /// Baseline canopy expectation (percent) before area-type adjustment.
    ///
    /// `SemiArid` folds to the arid baseline rather than carrying its own
    /// row; the multiplier already distinguishes them continuously.
    #[must_use]
    pub const fn base_canopy_expectation_pct(self) -> f64 {
        match self {
            Self::Arid | Self::SemiArid => 8.0,
            Self::Mediterranean => 25.0,
            Self::Temperate | Self::Tropical => 35.0,
            Self::HumidTemperate => 40.0,
            Self::Continental | Self::Unknown => 30.0,
        }
    }

    /// Scaling applied to the per-area water-coverage baseline.
    ///
    /// Inverse of the vegetation sense of the multiplier: arid zones
    /// expect half the water, tropical zones half again as much.
    #[must_use]
    pub const fn water_expectation_factor(self) -> f64 {
        match self {
            Self::Arid | Self::SemiArid => 0.5,
            Self::Mediterranean => 0.8,
            Self::Temperate | Self::Unknown => 1.0,
            Self::Continental => 0.9,
            Self::HumidTemperate => 1.2,
            Self::Tropical => 1.5,
        }
    }
}

/// Climate classification for one location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateContext {
    /// Discrete climate label.
    pub zone: ClimateZone,
    /// Dimensionless vegetation-favorability multiplier in [0.65, 1.43].
    pub multiplier: f64,
    /// Elevation used during classification, if known.
    pub elevation_m: Option<f64>,
}

/// Lower bound of the climate multiplier.
pub const MULTIPLIER_MIN: f64 = 0.65;
/// Upper bound of the climate multiplier (1.30 base x 1.10 elevation).
pub const MULTIPLIER_MAX: f64 = 1.43;

/// Bounds on the final canopy expectation after area adjustment.
const CANOPY_EXPECTATION_RANGE: (f64, f64) = (3.0, 60.0);
/// Bounds on the final water expectation after area adjustment.
const WATER_EXPECTATION_RANGE: (f64, f64) = (1.0, 15.0);

impl ClimateContext {
    /// Expected canopy percentage for this climate in the given area type,
    /// clamped to [3, 60].
    ///
    /// The zone baseline (desert 8%, mediterranean 25%, temperate 35%, ...)
    /// is scaled by how much canopy the built form leaves room for: a
    /// downtown core supports far less than rural land in the same climate.
    #[must_use]
    pub fn canopy_expectation_pct(&self, area_type: AreaType) -> f64 {
        let base = self.zone.base_canopy_expectation_pct();
        let adjusted = base * canopy_area_factor(area_type);
        adjusted.clamp(CANOPY_EXPECTATION_RANGE.0, CANOPY_EXPECTATION_RANGE.1)
    }

    /// Expected surface-water percentage for this climate in the given
    /// area type, clamped to [1, 15].
    #[must_use]
    pub fn water_expectation_pct(&self, area_type: AreaType) -> f64 {
        let base = water_area_base_pct(area_type);
        let adjusted = base * self.zone.water_expectation_factor();
        adjusted.clamp(WATER_EXPECTATION_RANGE.0, WATER_EXPECTATION_RANGE.1)
    }
}

/// Classifies a location into a climate zone and multiplier.
///
/// The multiplier comes from a latitude-band x longitude-band table
/// (tropical-latitude <30°, temperate 30-45°, boreal >45°, crossed with
/// eastern-humid, interior-arid, and coastal bands of the continental US),
/// scaled up at elevation (x1.05 above 800 m, x1.10 above 1500 m) and
/// clamped to [0.65, 1.43]. The zone label re-buckets the multiplier
/// through fixed thresholds, with two sub-rules: the 30-40°N west coast is
/// flagged mediterranean, and the moderate boreal interior continental.
#[must_use]
pub fn classify(point: GeoPoint, elevation_m: Option<f64>) -> ClimateContext {
    let base = base_multiplier(point.lat(), point.lon());
    let multiplier =
        (base * elevation_factor(elevation_m)).clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
    let zone = zone_from_multiplier(multiplier, point.lat(), point.lon());

    log::debug!(
        "climate for ({:.3}, {:.3}) elev {elevation_m:?}: {zone} x{multiplier:.2}",
        point.lat(),
        point.lon(),
    );

    ClimateContext {
        zone,
        multiplier,
        elevation_m,
    }
}

/// Latitude-band x longitude-band base multiplier, in [0.65, 1.30].
fn base_multiplier(lat: f64, lon: f64) -> f64 {
    let abs_lat = lat.abs();

    if abs_lat < 30.0 {
        // Gulf coast and Florida are humid subtropical; the desert
        // southwest and the Baja coast are not.
        if lon > -100.0 {
            1.30
        } else if lon > -115.0 {
            0.68
        } else {
            0.80
        }
    } else if abs_lat <= 45.0 {
        if lon > -95.0 {
            1.15 // eastern humid
        } else if lon > -115.0 {
            0.70 // interior west arid
        } else if lon > -125.0 {
            0.95 // coastal mediterranean
        } else {
            1.20 // pacific coast rainforest
        }
    } else if lon > -110.0 {
        1.05 // eastern/central boreal
    } else if lon > -120.0 {
        0.85 // northern interior steppe
    } else {
        1.18 // pacific northwest coast
    }
}

/// Elevation uplift: montane terrain holds more moisture than the
/// surrounding lowlands at the same latitude.
fn elevation_factor(elevation_m: Option<f64>) -> f64 {
    match elevation_m {
        Some(e) if e > 1500.0 => 1.10,
        Some(e) if e > 800.0 => 1.05,
        _ => 1.00,
    }
}

/// Re-buckets the multiplier into a discrete zone label.
fn zone_from_multiplier(multiplier: f64, lat: f64, lon: f64) -> ClimateZone {
    // Dry-summer west coast: the multiplier alone cannot distinguish
    // mediterranean from a moderate interior climate.
    let coastal_mediterranean = (30.0..=40.0).contains(&lat) && (-125.0..=-115.0).contains(&lon);

    let zone = if multiplier < 0.75 {
        ClimateZone::Arid
    } else if multiplier < 0.90 {
        ClimateZone::SemiArid
    } else if multiplier < 1.05 {
        ClimateZone::Temperate
    } else if multiplier < 1.20 {
        ClimateZone::HumidTemperate
    } else {
        ClimateZone::Tropical
    };

    if coastal_mediterranean && matches!(zone, ClimateZone::Temperate | ClimateZone::SemiArid) {
        return ClimateZone::Mediterranean;
    }

    // Moderate boreal interior reads as continental, not temperate.
    if lat.abs() > 45.0
        && lon > -120.0
        && matches!(zone, ClimateZone::Temperate | ClimateZone::HumidTemperate)
    {
        return ClimateZone::Continental;
    }

    zone
}

/// How much canopy the built form leaves room for, relative to the
/// climate baseline.
const fn canopy_area_factor(area_type: AreaType) -> f64 {
    match area_type {
        AreaType::UrbanCore => 0.75,
        AreaType::UrbanCoreLowrise => 0.80,
        AreaType::HistoricUrban => 0.85,
        AreaType::UrbanResidential => 0.90,
        AreaType::Suburban | AreaType::Unknown => 1.00,
        AreaType::Exurban => 1.10,
        AreaType::Rural => 1.25,
    }
}

/// Baseline surface-water percentage per area type, before the climate
/// factor.
const fn water_area_base_pct(area_type: AreaType) -> f64 {
    match area_type {
        AreaType::UrbanCore => 2.5,
        AreaType::UrbanCoreLowrise | AreaType::HistoricUrban => 3.0,
        AreaType::UrbanResidential => 3.5,
        AreaType::Suburban | AreaType::Unknown => 5.0,
        AreaType::Exurban => 6.5,
        AreaType::Rural => 8.0,
    }
}
