//! R-tree index over green polygons.
//!
//! [`compute_exposure`](crate::compute_exposure) tests every polygon for every
//! segment. When a route crosses a large area (hundreds of parks and woods), most of
//! those tests are against polygons nowhere near the segment. The index stores each
//! polygon's bounding envelope in an R-tree and only runs the ray-casting test on
//! polygons whose envelope contains the sample point.
//!
//! Envelopes are closed, and a point outside a ring's closed envelope is never
//! inside the ring under the even-odd rule, so the index classifies every segment
//! exactly as the linear scan does.

use rstar::{RTree, RTreeObject, AABB};

use crate::exposure::ExposureBreakdown;
use crate::geo_utils::{haversine_distance_km, midpoint, point_in_polygon};
use crate::{GeoPoint, GreenPolygon};

/// Envelope of one polygon, pointing back into [`GreenSpaceIndex::polygons`].
#[derive(Debug, Clone)]
struct PolygonEnvelope {
    index: usize,
    min_lng: f64,
    min_lat: f64,
    max_lng: f64,
    max_lat: f64,
}

impl RTreeObject for PolygonEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

/// Spatial index of the usable (3+ vertex) polygons of a green-space set.
pub struct GreenSpaceIndex {
    polygons: Vec<GreenPolygon>,
    tree: RTree<PolygonEnvelope>,
}

impl GreenSpaceIndex {
    /// Build an index, discarding polygons with fewer than 3 vertices.
    pub fn new(polygons: Vec<GreenPolygon>) -> Self {
        let polygons: Vec<GreenPolygon> = polygons.into_iter().filter(|p| p.is_valid()).collect();

        let envelopes: Vec<PolygonEnvelope> = polygons
            .iter()
            .enumerate()
            .map(|(index, polygon)| {
                let mut env = PolygonEnvelope {
                    index,
                    min_lng: f64::MAX,
                    min_lat: f64::MAX,
                    max_lng: f64::MIN,
                    max_lat: f64::MIN,
                };
                for p in &polygon.points {
                    env.min_lng = env.min_lng.min(p.longitude);
                    env.min_lat = env.min_lat.min(p.latitude);
                    env.max_lng = env.max_lng.max(p.longitude);
                    env.max_lat = env.max_lat.max(p.latitude);
                }
                env
            })
            .collect();

        Self {
            polygons,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Number of indexed (usable) polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// The indexed polygons, degenerate ones already removed.
    pub fn polygons(&self) -> &[GreenPolygon] {
        &self.polygons
    }

    /// Whether `point` lies inside any indexed polygon.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let probe = AABB::from_point([point.longitude, point.latitude]);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .any(|env| point_in_polygon(point, &self.polygons[env.index].points))
    }

    /// Same classification as [`crate::geo_utils::segment_intersects_polygon`] applied
    /// to every polygon: start, end or midpoint inside any of them.
    pub fn segment_is_green(&self, start: &GeoPoint, end: &GeoPoint) -> bool {
        self.contains(start) || self.contains(end) || self.contains(&midpoint(start, end))
    }

    /// Indexed equivalent of [`crate::compute_exposure_breakdown`].
    pub fn exposure_breakdown(&self, route: &[GeoPoint]) -> ExposureBreakdown {
        let mut breakdown = ExposureBreakdown::default();
        if route.len() < 2 || self.is_empty() {
            return breakdown;
        }

        for w in route.windows(2) {
            let is_green = self.segment_is_green(&w[0], &w[1]);
            breakdown.add_segment(haversine_distance_km(&w[0], &w[1]), is_green);
        }

        breakdown
    }

    /// Indexed equivalent of [`crate::compute_exposure`].
    pub fn exposure(&self, route: &[GeoPoint]) -> f64 {
        self.exposure_breakdown(route).percentage()
    }
}
