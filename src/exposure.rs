//! # Green Exposure Aggregation
//!
//! Walks a route segment by segment and measures how much of its distance passes
//! through green polygons.
//!
//! ## Algorithm
//! 1. Routes with fewer than 2 points have no distance: exposure is 0
//! 2. Polygons with fewer than 3 vertices are discarded
//! 3. Each segment's haversine length is added to the total
//! 4. A segment is green if [`segment_intersects_polygon`] holds for any polygon
//! 5. Exposure = green distance / total distance × 100, clamped to [0, 100]
//!
//! Cost is O(segments × polygons × vertices). That is fine for a single walk against
//! the polygons in its bounding box; [`crate::GreenSpaceIndex`] gives the same answer
//! with an R-tree when the polygon set is large.

use crate::geo_utils::{haversine_distance_km, segment_intersects_polygon};
use crate::{GeoPoint, GreenPolygon};

/// Distance accounting for one route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ExposureBreakdown {
    /// Sum of all segment lengths (km)
    pub total_distance_km: f64,
    /// Sum of the lengths of green segments (km)
    pub green_distance_km: f64,
    pub segment_count: u32,
    pub green_segment_count: u32,
}

impl ExposureBreakdown {
    /// Green share of the total distance, in percent, clamped to [0, 100].
    pub fn percentage(&self) -> f64 {
        if self.total_distance_km > 0.0 {
            (self.green_distance_km / self.total_distance_km * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    pub(crate) fn add_segment(&mut self, length_km: f64, is_green: bool) {
        self.total_distance_km += length_km;
        self.segment_count += 1;
        if is_green {
            self.green_distance_km += length_km;
            self.green_segment_count += 1;
        }
    }
}

/// Percentage (0-100) of the route's distance that passes through green polygons.
///
/// # Example
///
/// ```rust
/// use green_exposure::{GeoPoint, GreenPolygon, compute_exposure};
///
/// let park = GreenPolygon::new(vec![
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 1.0),
///     GeoPoint::new(1.0, 1.0),
///     GeoPoint::new(1.0, 0.0),
/// ]);
/// let route = vec![GeoPoint::new(0.2, 0.2), GeoPoint::new(0.8, 0.8)];
///
/// assert_eq!(compute_exposure(&route, &[park]), 100.0);
/// ```
pub fn compute_exposure(route: &[GeoPoint], polygons: &[GreenPolygon]) -> f64 {
    compute_exposure_breakdown(route, polygons).percentage()
}

/// Full distance accounting behind [`compute_exposure`].
///
/// When the route is too short or no polygon is usable, the breakdown is empty
/// (all zeros) and the segments are not measured.
pub fn compute_exposure_breakdown(
    route: &[GeoPoint],
    polygons: &[GreenPolygon],
) -> ExposureBreakdown {
    let mut breakdown = ExposureBreakdown::default();
    if route.len() < 2 {
        return breakdown;
    }

    let usable: Vec<&GreenPolygon> = polygons.iter().filter(|p| p.is_valid()).collect();
    if usable.is_empty() {
        return breakdown;
    }

    for w in route.windows(2) {
        let (start, end) = (&w[0], &w[1]);
        let is_green = usable
            .iter()
            .any(|polygon| segment_intersects_polygon(start, end, &polygon.points));
        breakdown.add_segment(haversine_distance_km(start, end), is_green);
    }

    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// 1°×1° square with its south-west corner at (lat, lng).
    fn square(lat: f64, lng: f64) -> GreenPolygon {
        GreenPolygon::new(vec![
            GeoPoint::new(lat, lng),
            GeoPoint::new(lat, lng + 1.0),
            GeoPoint::new(lat + 1.0, lng + 1.0),
            GeoPoint::new(lat + 1.0, lng),
        ])
    }

    #[test]
    fn test_degenerate_routes() {
        let polygons = vec![square(0.0, 0.0)];
        assert_eq!(compute_exposure(&[], &polygons), 0.0);
        assert_eq!(compute_exposure(&[GeoPoint::new(0.5, 0.5)], &polygons), 0.0);
    }

    #[test]
    fn test_no_green_data() {
        let route = vec![GeoPoint::new(0.5, 0.5), GeoPoint::new(0.6, 0.6)];
        assert_eq!(compute_exposure(&route, &[]), 0.0);
    }

    #[test]
    fn test_only_degenerate_polygons() {
        let route = vec![GeoPoint::new(0.5, 0.5), GeoPoint::new(0.6, 0.6)];
        let slivers = vec![
            GreenPolygon::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]),
            GreenPolygon::new(vec![]),
        ];
        assert_eq!(compute_exposure(&route, &slivers), 0.0);
        assert_eq!(compute_exposure_breakdown(&route, &slivers), ExposureBreakdown::default());
    }

    #[test]
    fn test_fully_enclosed_route() {
        let route = vec![
            GeoPoint::new(0.2, 0.2),
            GeoPoint::new(0.5, 0.6),
            GeoPoint::new(0.8, 0.3),
        ];
        assert_eq!(compute_exposure(&route, &[square(0.0, 0.0)]), 100.0);
    }

    #[test]
    fn test_fully_external_route() {
        let route = vec![
            GeoPoint::new(5.2, 5.2),
            GeoPoint::new(5.5, 5.6),
            GeoPoint::new(5.8, 5.3),
        ];
        let polygons = vec![square(0.0, 0.0), square(-3.0, 2.0)];
        assert_eq!(compute_exposure(&route, &polygons), 0.0);
    }

    #[test]
    fn test_half_and_half_route() {
        // Two equal 0.6° segments along a meridian. The first starts inside the band
        // and is green; the second has both ends and its midpoint north of it.
        let band = GreenPolygon::new(vec![
            GeoPoint::new(0.1, 0.0),
            GeoPoint::new(0.1, 1.0),
            GeoPoint::new(0.7, 1.0),
            GeoPoint::new(0.7, 0.0),
        ]);
        let route = vec![
            GeoPoint::new(0.2, 0.5),
            GeoPoint::new(0.8, 0.5),
            GeoPoint::new(1.4, 0.5),
        ];
        let breakdown = compute_exposure_breakdown(&route, &[band]);
        assert_eq!(breakdown.segment_count, 2);
        assert_eq!(breakdown.green_segment_count, 1);
        assert!(approx_eq(breakdown.percentage(), 50.0, 1e-6));
    }

    #[test]
    fn test_green_segments_weighted_by_distance() {
        // Short green segment followed by a long non-green one
        let route = vec![
            GeoPoint::new(0.5, 0.1),
            GeoPoint::new(0.5, 0.4),
            GeoPoint::new(0.5, 3.0),
            GeoPoint::new(0.5, 6.0),
        ];
        let breakdown = compute_exposure_breakdown(&route, &[square(0.0, 0.0)]);
        // Segment 0.4 → 3.0 starts inside the square, so it is green too
        assert_eq!(breakdown.green_segment_count, 2);
        let expected = (0.3 + 2.6) / 5.9 * 100.0;
        assert!(approx_eq(breakdown.percentage(), expected, 0.01));
    }

    #[test]
    fn test_thin_crossing_counts_as_non_green() {
        let strip = GreenPolygon::new(vec![
            GeoPoint::new(-1.0, 0.2),
            GeoPoint::new(-1.0, 0.3),
            GeoPoint::new(1.0, 0.3),
            GeoPoint::new(1.0, 0.2),
        ]);
        let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
        assert_eq!(compute_exposure(&route, &[strip]), 0.0);
    }

    #[test]
    fn test_overlapping_polygons_count_segment_once() {
        let route = vec![GeoPoint::new(0.5, 0.2), GeoPoint::new(0.5, 0.8)];
        let polygons = vec![square(0.0, 0.0), square(0.0, 0.0), square(-0.5, -0.5)];
        let breakdown = compute_exposure_breakdown(&route, &polygons);
        assert_eq!(breakdown.green_segment_count, 1);
        assert!(approx_eq(breakdown.green_distance_km, breakdown.total_distance_km, 1e-12));
        assert_eq!(breakdown.percentage(), 100.0);
    }

    #[test]
    fn test_repeated_points_have_no_distance() {
        let p = GeoPoint::new(0.5, 0.5);
        let route = vec![p, p, p];
        let breakdown = compute_exposure_breakdown(&route, &[square(0.0, 0.0)]);
        assert_eq!(breakdown.segment_count, 2);
        assert_eq!(breakdown.total_distance_km, 0.0);
        assert_eq!(breakdown.percentage(), 0.0);
    }

    #[test]
    fn test_exposure_bounds() {
        let polygons = vec![square(0.0, 0.0), square(2.0, 2.0)];
        for k in 0..10 {
            let route: Vec<GeoPoint> = (0..12)
                .map(|i| {
                    let t = (i * (k + 1)) as f64;
                    GeoPoint::new((t * 0.7).sin() * 3.0, (t * 0.3).cos() * 3.0)
                })
                .collect();
            let pct = compute_exposure(&route, &polygons);
            assert!((0.0..=100.0).contains(&pct), "out of bounds: {}", pct);
        }
    }
}
