//! The three canopy data sources.
//!
//! * [`TiledCanopySource`] — a regionally-tiled tree-canopy-cover product
//!   (the primary). Tiles are indexed in an R-tree and candidates are
//!   filtered to footprints that actually **contain** the query point;
//!   taking "the first available tile" instead would let an adjacent
//!   region's mosaic contaminate the measurement near tile seams.
//! * [`GlobalForestSource`] — a global forest-cover product (validation).
//! * [`LandCoverTreeSource`] — the tree-class fraction of a categorical
//!   land-cover classifier (validation).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beauty_map_geo_models::GeoPoint;
use beauty_map_raster::{
    BufferRegion, RasterError, RasterQuery, RasterSource, RasterValue, Reducer,
};
use geo::{Contains as _, Rect, coord};
use rstar::{AABB, RTree, RTreeObject};

use crate::{CanopySource, SourceRole};

/// A regional tile's footprint in WGS84 degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFootprint {
    /// Tile identifier within the product (e.g. `"conus_w2"`).
    pub tile_id: String,
    /// Western edge, degrees longitude.
    pub min_lon: f64,
    /// Southern edge, degrees latitude.
    pub min_lat: f64,
    /// Eastern edge, degrees longitude.
    pub max_lon: f64,
    /// Northern edge, degrees latitude.
    pub max_lat: f64,
}

/// A tile stored in the R-tree with its footprint rectangle.
struct TileEntry {
    tile_id: String,
    envelope: AABB<[f64; 2]>,
    footprint: Rect<f64>,
}

impl RTreeObject for TileEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Primary source: regionally-tiled tree canopy cover.
pub struct TiledCanopySource {
    id: String,
    band: String,
    scale_m: f64,
    tiles: RTree<TileEntry>,
    raster: Arc<dyn RasterSource>,
}

impl TiledCanopySource {
    /// Builds the source and its tile index.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        band: impl Into<String>,
        scale_m: f64,
        tiles: Vec<TileFootprint>,
        raster: Arc<dyn RasterSource>,
    ) -> Self {
        let entries = tiles
            .into_iter()
            .map(|tile| TileEntry {
                envelope: AABB::from_corners(
                    [tile.min_lon, tile.min_lat],
                    [tile.max_lon, tile.max_lat],
                ),
                footprint: Rect::new(
                    coord! { x: tile.min_lon, y: tile.min_lat },
                    coord! { x: tile.max_lon, y: tile.max_lat },
                ),
                tile_id: tile.tile_id,
            })
            .collect();

        Self {
            id: id.into(),
            band: band.into(),
            scale_m,
            tiles: RTree::bulk_load(entries),
            raster,
        }
    }

    /// Finds the tile whose footprint contains the point.
    ///
    /// Tiles within one product do not overlap, so first match wins.
    fn containing_tile(&self, point: GeoPoint) -> Option<&str> {
        let query_env = AABB::from_point([point.lon(), point.lat()]);
        let geo_point = geo::Point::new(point.lon(), point.lat());

        self.tiles
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.footprint.contains(&geo_point))
            .map(|entry| entry.tile_id.as_str())
    }
}

#[async_trait]
impl CanopySource for TiledCanopySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> SourceRole {
        SourceRole::Primary
    }

    async fn canopy_pct(
        &self,
        point: GeoPoint,
        radius_m: f64,
        deadline: Duration,
    ) -> Result<f64, RasterError> {
        let Some(tile_id) = self.containing_tile(point) else {
            log::debug!(
                "{}: no tile footprint contains ({:.4}, {:.4})",
                self.id,
                point.lat(),
                point.lon()
            );
            return Err(RasterError::DataUnavailable {
                source_id: self.id.clone(),
            });
        };

        let query = RasterQuery {
            source_id: format!("{}:{tile_id}", self.id),
            band: self.band.clone(),
            buffer: BufferRegion {
                center: point,
                radius_m,
            },
            scale_m: self.scale_m,
            reducer: Reducer::Mean,
        };

        let value = self.raster.query(&query, deadline).await?;
        scalar_pct(&self.id, &value)
    }
}

/// Validation source: global forest-cover product mean.
pub struct GlobalForestSource {
    id: String,
    band: String,
    scale_m: f64,
    raster: Arc<dyn RasterSource>,
}

impl GlobalForestSource {
    /// Creates the source.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        band: impl Into<String>,
        scale_m: f64,
        raster: Arc<dyn RasterSource>,
    ) -> Self {
        Self {
            id: id.into(),
            band: band.into(),
            scale_m,
            raster,
        }
    }
}

#[async_trait]
impl CanopySource for GlobalForestSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> SourceRole {
        SourceRole::Validation
    }

    async fn canopy_pct(
        &self,
        point: GeoPoint,
        radius_m: f64,
        deadline: Duration,
    ) -> Result<f64, RasterError> {
        let query = RasterQuery {
            source_id: self.id.clone(),
            band: self.band.clone(),
            buffer: BufferRegion {
                center: point,
                radius_m,
            },
            scale_m: self.scale_m,
            reducer: Reducer::Mean,
        };

        let value = self.raster.query(&query, deadline).await?;
        scalar_pct(&self.id, &value)
    }
}

/// Validation source: tree-class fraction of a categorical land-cover
/// classifier, read out of a frequency histogram.
pub struct LandCoverTreeSource {
    id: String,
    band: String,
    scale_m: f64,
    tree_classes: Vec<u16>,
    raster: Arc<dyn RasterSource>,
}

impl LandCoverTreeSource {
    /// Creates the source. `tree_classes` are the classifier's class
    /// values counted as tree cover (e.g. `[10]` for ESA WorldCover).
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        band: impl Into<String>,
        scale_m: f64,
        tree_classes: Vec<u16>,
        raster: Arc<dyn RasterSource>,
    ) -> Self {
        Self {
            id: id.into(),
            band: band.into(),
            scale_m,
            tree_classes,
            raster,
        }
    }
}

#[async_trait]
impl CanopySource for LandCoverTreeSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> SourceRole {
        SourceRole::Validation
    }

    async fn canopy_pct(
        &self,
        point: GeoPoint,
        radius_m: f64,
        deadline: Duration,
    ) -> Result<f64, RasterError> {
        let query = RasterQuery {
            source_id: self.id.clone(),
            band: self.band.clone(),
            buffer: BufferRegion {
                center: point,
                radius_m,
            },
            scale_m: self.scale_m,
            reducer: Reducer::FrequencyHistogram,
        };

        let value = self.raster.query(&query, deadline).await?;
        let fraction = value
            .class_fraction(&self.tree_classes)
            .ok_or_else(|| RasterError::DataUnavailable {
                source_id: self.id.clone(),
            })?;
        Ok(fraction * 100.0)
    }
}

/// Interprets a scalar-capable raster result as a percentage.
fn scalar_pct(source_id: &str, value: &RasterValue) -> Result<f64, RasterError> {
    value
        .as_scalar()
        .ok_or_else(|| RasterError::Malformed {
            source_id: source_id.to_string(),
            message: "expected a scalar result".to_string(),
        })
}
