//! Street-tree data as a capability-queried collaborator.
//!
//! Municipal street-tree inventories exist for some cities and not
//! others. Rather than conditional wiring at the call sites, the pipeline
//! talks to one trait: providers advertise coverage via [`StreetTreeProvider::has_data`]
//! and unsupported locations get the no-op implementation, which simply
//! reports no coverage.

use async_trait::async_trait;
use beauty_map_geo_models::GeoPoint;

/// A source of municipal street-tree counts.
#[async_trait]
pub trait StreetTreeProvider: Send + Sync {
    /// Whether this provider has inventory coverage at `point`.
    fn has_data(&self, point: GeoPoint) -> bool;

    /// Number of inventoried street trees within `radius_m` of `point`,
    /// or `None` when the count is unknown (no coverage, lookup failed).
    async fn street_tree_count(&self, point: GeoPoint, radius_m: f64) -> Option<u32>;
}

/// Provider for locations with no street-tree inventory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStreetTreeData;

#[async_trait]
impl StreetTreeProvider for NoStreetTreeData {
    fn has_data(&self, _point: GeoPoint) -> bool {
        false
    }

    async fn street_tree_count(&self, _point: GeoPoint, _radius_m: f64) -> Option<u32> {
        None
    }
}
