//! # Geographic Utilities
//!
//! Geometry kernel for green-exposure analysis.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance_km`] | Great-circle distance between two points |
//! | [`polyline_length_km`] | Total length of a route in kilometers |
//! | [`point_in_polygon`] | Even-odd ray casting membership test |
//! | [`bounding_box_of`] | Padded bounding box of a point set |
//! | [`midpoint`] | Coordinate midpoint of a segment |
//! | [`segment_intersects_polygon`] | Three-point segment/polygon heuristic |
//!
//! ## Example
//!
//! ```rust
//! use green_exposure::{GeoPoint, geo_utils};
//!
//! let park = vec![
//!     GeoPoint::new(51.50, -0.17),
//!     GeoPoint::new(51.50, -0.15),
//!     GeoPoint::new(51.52, -0.15),
//!     GeoPoint::new(51.52, -0.17),
//! ];
//!
//! assert!(geo_utils::point_in_polygon(&GeoPoint::new(51.51, -0.16), &park));
//! assert!(!geo_utils::point_in_polygon(&GeoPoint::new(51.53, -0.16), &park));
//!
//! let bbox = geo_utils::bounding_box_of(&park, geo_utils::DEFAULT_BBOX_PADDING).unwrap();
//! assert!((bbox.south - 51.49).abs() < 1e-9);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances assume a spherical Earth with mean radius 6,371 km, which is accurate to
//! within about 0.3% for walking-scale distances.
//!
//! ### Point in Polygon
//!
//! Polygons are treated as planar in (longitude, latitude) space. Rings are closed
//! implicitly, so the last vertex does not need to repeat the first. The test casts a
//! ray eastward from the point and counts edge crossings (even-odd rule).
//!
//! Points exactly on the boundary follow a half-open rule: an edge counts as crossed
//! when exactly one of its endpoints lies strictly north of the point and the crossing
//! longitude is strictly east of it. For an axis-aligned rectangle this puts points on
//! the south and west edges inside and points on the north and east edges outside.
//! Real routes almost never land exactly on a polygon edge, so this only matters for
//! synthetic inputs.

use geo::{BoundingRect, MultiPoint, Point};

use crate::{AnalysisError, BoundingBox, GeoPoint};

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Padding (degrees) added on every side of a route's bounding box.
pub const DEFAULT_BBOX_PADDING: f64 = 0.01;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in kilometers between two points.
///
/// Symmetric, never negative, and zero only when the points are equal.
///
/// ```rust
/// use green_exposure::{GeoPoint, geo_utils};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance_km(&london, &paris);
/// assert!((distance - 343.5).abs() < 1.0);
/// ```
#[inline]
pub fn haversine_distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Total length of a route in kilometers. Empty or single-point routes return 0.0.
pub fn polyline_length_km(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance_km(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Polygon Membership
// =============================================================================

/// Test whether `point` lies inside the ring `polygon` (even-odd rule).
///
/// See the [module notes](self#point-in-polygon) for the boundary rule. Rings with
/// fewer than three vertices enclose nothing and always return `false`.
pub fn point_in_polygon(point: &GeoPoint, polygon: &[GeoPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].longitude, polygon[i].latitude);
        let (xj, yj) = (polygon[j].longitude, polygon[j].latitude);

        // (yi > y) != (yj > y) also rules out horizontal edges, so yj - yi is never 0
        if (yi > point.latitude) != (yj > point.latitude) {
            let crossing_lng = (xj - xi) * (point.latitude - yi) / (yj - yi) + xi;
            if point.longitude < crossing_lng {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Coordinate midpoint of a segment (planar average, not the great-circle midpoint).
#[inline]
pub fn midpoint(a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    GeoPoint::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}

/// Conservative check for whether a route segment passes through a polygon.
///
/// Returns `true` if the start, the end, or the midpoint of the segment is inside
/// the polygon. This is a sampling heuristic, not a geometric intersection test: a
/// segment that cuts across a narrow strip of the polygon without any of the three
/// samples landing inside is reported as outside. Exposure scores are comparative,
/// so the false-negative bias is accepted in exchange for constant work per polygon.
pub fn segment_intersects_polygon(start: &GeoPoint, end: &GeoPoint, polygon: &[GeoPoint]) -> bool {
    point_in_polygon(start, polygon)
        || point_in_polygon(end, polygon)
        || point_in_polygon(&midpoint(start, end), polygon)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Bounding box of `points`, expanded by `padding` degrees on every side.
///
/// Returns [`AnalysisError::EmptyInput`] when `points` is empty. The result is not
/// range-checked; near the poles or the antimeridian the padding can push it out of
/// range, which [`BoundingBox::validate`] reports.
///
/// ```rust
/// use green_exposure::{GeoPoint, geo_utils};
///
/// let track = vec![
///     GeoPoint::new(51.5000, -0.1300),
///     GeoPoint::new(51.5100, -0.1200),
/// ];
///
/// let bbox = geo_utils::bounding_box_of(&track, 0.0).unwrap();
/// assert_eq!(bbox.south, 51.5000);
/// assert_eq!(bbox.east, -0.1200);
/// ```
pub fn bounding_box_of(points: &[GeoPoint], padding: f64) -> Result<BoundingBox, AnalysisError> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect();

    let rect = multi.bounding_rect().ok_or(AnalysisError::EmptyInput)?;

    Ok(BoundingBox {
        south: rect.min().y - padding,
        west: rect.min().x - padding,
        north: rect.max().y + padding,
        east: rect.max().x + padding,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
