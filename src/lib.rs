//! # Green Exposure
//!
//! Measures how much of a walking route passes through green space (parks, woods,
//! forests, grass and meadow land-use, gardens, scrub).
//!
//! This library provides:
//! - Encoded polyline decoding/encoding
//! - A small geometry kernel (haversine distance, point-in-polygon, bounding boxes)
//! - Distance-weighted green exposure for a route against a set of green polygons
//! - An orchestrator that fetches green spaces for the route's area and degrades
//!   gracefully when the provider fails
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch analysis with rayon
//! - **`http`** - Enable OSRM, Overpass and Nominatim clients
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use green_exposure::{analyze_route, BoundingBox, FetchError, GeoPoint, GreenPolygon};
//!
//! // A walk through a park
//! let route = vec![
//!     GeoPoint::new(51.5073, -0.1657),
//!     GeoPoint::new(51.5080, -0.1640),
//!     GeoPoint::new(51.5090, -0.1620),
//! ];
//!
//! // Green-space provider: usually an HTTP client, here a fixed polygon
//! let provider = |_: &BoundingBox| -> Result<Vec<GreenPolygon>, FetchError> {
//!     Ok(vec![GreenPolygon::new(vec![
//!         GeoPoint::new(51.500, -0.175),
//!         GeoPoint::new(51.500, -0.150),
//!         GeoPoint::new(51.515, -0.150),
//!         GeoPoint::new(51.515, -0.175),
//!     ])])
//! };
//!
//! let result = analyze_route(&route, &provider).unwrap();
//! println!("{:.2} km, {:.0}% green", result.total_distance_km, result.green_percentage);
//! assert_eq!(result.green_percentage, 100.0);
//! ```

pub mod analysis;
pub mod error;
pub mod exposure;
pub mod geo_utils;
pub mod index;
pub mod polyline;
pub mod query;

pub use analysis::{
    analyze_encoded_route, analyze_route, analyze_route_detailed, analyze_route_with_config,
    finish_analysis, plan_green_space_query, GreenSpaceOutcome, GreenSpaceSource, RouteAnalysis,
};
pub use error::{AnalysisError, DecodeError, FetchError};
pub use exposure::{compute_exposure, compute_exposure_breakdown, ExposureBreakdown};
pub use geo_utils::{
    bounding_box_of, haversine_distance_km, point_in_polygon, segment_intersects_polygon,
};
pub use index::GreenSpaceIndex;
pub use polyline::{decode_polyline, encode_polyline};
pub use query::{build_green_space_query, GreenCategory, GreenSpaceQuery};

// HTTP clients for routing, green-space and geocoding providers
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{ProviderConfig, ProviderError, WalkAnalysis, WalkAnalyzer};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("GreenExposureRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use green_exposure::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Axis-aligned latitude/longitude box.
///
/// Derived from a route with [`bounding_box_of`]; a usable box has
/// `south < north`, `west < east` and every edge within coordinate range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Check the ordering and range invariants.
    pub fn is_valid(&self) -> bool {
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        let lng_ok = |v: f64| (-180.0..=180.0).contains(&v);

        lat_ok(self.south)
            && lat_ok(self.north)
            && lng_ok(self.west)
            && lng_ok(self.east)
            && self.south < self.north
            && self.west < self.east
    }

    /// [`is_valid`](Self::is_valid) as a `Result`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AnalysisError::InvalidBoundingBox(*self))
        }
    }

    /// Whether the point lies inside or on the edge of the box.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.south
            && point.latitude <= self.north
            && point.longitude >= self.west
            && point.longitude <= self.east
    }

    /// Get the center point of the box.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

/// A green area as a ring of vertices. The ring is closed implicitly: the last
/// vertex connects back to the first and need not repeat it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GreenPolygon {
    pub points: Vec<GeoPoint>,
}

impl GreenPolygon {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Polygons with fewer than 3 vertices enclose no area and are ignored.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }
}

/// Outcome of analysing one route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ExposureResult {
    /// Sum of haversine segment lengths in kilometers
    pub total_distance_km: f64,
    /// Share of the distance through green space (0-100)
    pub green_percentage: f64,
}

/// Configuration for route analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct AnalysisConfig {
    /// Degrees added on every side of the route's bounding box before querying
    /// green spaces. Default: 0.01 (~1.1 km of latitude)
    pub bbox_padding_deg: f64,

    /// Server-side timeout requested from the green-space provider.
    /// Default: 25 seconds
    pub query_timeout_secs: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bbox_padding_deg: geo_utils::DEFAULT_BBOX_PADDING,
            query_timeout_secs: query::DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Batch Processing
// ============================================================================

/// Green exposure for many routes against one polygon set, in parallel.
///
/// Polygons are indexed once and shared by all routes.
#[cfg(feature = "parallel")]
pub fn compute_exposures_parallel(
    routes: &[Vec<GeoPoint>],
    polygons: Vec<GreenPolygon>,
) -> Vec<f64> {
    use rayon::prelude::*;

    let index = GreenSpaceIndex::new(polygons);
    routes.par_iter().map(|route| index.exposure(route)).collect()
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{debug, info, warn};

    /// Decode an encoded polyline. `None` if the string is malformed; an empty
    /// string is a valid empty route.
    #[uniffi::export]
    pub fn ffi_decode_polyline(encoded: String) -> Option<Vec<GeoPoint>> {
        init_logging();
        match decode_polyline(&encoded) {
            Ok(points) => {
                debug!("[GreenExposureRust] Decoded {} points", points.len());
                Some(points)
            }
            Err(e) => {
                warn!("[GreenExposureRust] Polyline decode failed: {}", e);
                None
            }
        }
    }

    #[uniffi::export]
    pub fn ffi_encode_polyline(points: Vec<GeoPoint>) -> String {
        encode_polyline(&points)
    }

    #[uniffi::export]
    pub fn ffi_haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
        haversine_distance_km(&a, &b)
    }

    #[uniffi::export]
    pub fn ffi_point_in_polygon(point: GeoPoint, polygon: Vec<GeoPoint>) -> bool {
        point_in_polygon(&point, &polygon)
    }

    #[uniffi::export]
    pub fn ffi_compute_exposure(route: Vec<GeoPoint>, polygons: Vec<GreenPolygon>) -> f64 {
        init_logging();
        let pct = compute_exposure(&route, &polygons);
        debug!(
            "[GreenExposureRust] Exposure {:.1}% for {} points / {} polygons",
            pct,
            route.len(),
            polygons.len()
        );
        pct
    }

    /// Overpass QL for the green spaces around a route, so the host app can run the
    /// query itself. `None` if the route is too short or its box is invalid.
    #[uniffi::export]
    pub fn ffi_green_space_query(route: Vec<GeoPoint>, config: AnalysisConfig) -> Option<String> {
        init_logging();
        match plan_green_space_query(&route, &config) {
            Ok(query) => Some(query.to_overpass_ql()),
            Err(e) => {
                warn!("[GreenExposureRust] Cannot build green-space query: {}", e);
                None
            }
        }
    }

    /// Analyse a route against green polygons the host already fetched.
    #[uniffi::export]
    pub fn ffi_analyze_route(
        route: Vec<GeoPoint>,
        polygons: Vec<GreenPolygon>,
        config: AnalysisConfig,
    ) -> Option<ExposureResult> {
        init_logging();
        info!(
            "[GreenExposureRust] analyze_route called with {} points, {} polygons",
            route.len(),
            polygons.len()
        );
        let source = |_: &BoundingBox| -> Result<Vec<GreenPolygon>, FetchError> {
            Ok(polygons.clone())
        };
        match analyze_route_with_config(&route, &source, &config) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("[GreenExposureRust] Analysis failed: {}", e);
                None
            }
        }
    }

    /// Batch exposure for many routes against one polygon set.
    #[uniffi::export]
    pub fn ffi_compute_exposures_batch(
        routes: Vec<Vec<GeoPoint>>,
        polygons: Vec<GreenPolygon>,
    ) -> Vec<f64> {
        init_logging();
        info!(
            "[GreenExposureRust] Batch exposure for {} routes, {} polygons",
            routes.len(),
            polygons.len()
        );

        let start = std::time::Instant::now();
        let results = compute_exposures_parallel(&routes, polygons);
        info!("[GreenExposureRust] Batch done in {:?}", start.elapsed());
        results
    }

    #[uniffi::export]
    pub fn default_analysis_config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    /// Parse a raw Overpass JSON response into green polygons. `None` if the
    /// response is not valid Overpass JSON.
    #[cfg(feature = "http")]
    #[uniffi::export]
    pub fn ffi_parse_overpass_response(json: String) -> Option<Vec<GreenPolygon>> {
        init_logging();
        match crate::http::parse_overpass_response(&json) {
            Ok(polygons) => Some(polygons),
            Err(e) => {
                warn!("[GreenExposureRust] Overpass parse failed: {}", e);
                None
            }
        }
    }

    /// Route between two points, fetch green spaces and analyse (blocking).
    #[cfg(feature = "http")]
    #[uniffi::export]
    pub fn ffi_analyze_walk(
        start: GeoPoint,
        end: GeoPoint,
        config: crate::http::ProviderConfig,
    ) -> Option<crate::http::WalkSummary> {
        init_logging();
        info!(
            "[GreenExposureRust] analyze_walk ({:.5},{:.5}) -> ({:.5},{:.5})",
            start.latitude, start.longitude, end.latitude, end.longitude
        );
        match crate::http::analyze_walk_blocking(start, end, config) {
            Ok(walk) => Some(walk.summary()),
            Err(e) => {
                warn!("[GreenExposureRust] Walk analysis failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(51.5074, -0.1278).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_bounding_box_validation() {
        let ok = BoundingBox { south: 51.49, west: -0.14, north: 51.52, east: -0.11 };
        assert!(ok.is_valid());
        assert_eq!(ok.validate(), Ok(()));

        let flat = BoundingBox { south: 51.5, west: -0.14, north: 51.5, east: -0.11 };
        assert!(!flat.is_valid());

        let inverted_lng = BoundingBox { south: 51.49, west: -0.11, north: 51.52, east: -0.14 };
        assert_eq!(inverted_lng.validate(), Err(AnalysisError::InvalidBoundingBox(inverted_lng)));

        let past_antimeridian = BoundingBox { south: 0.0, west: 179.5, north: 1.0, east: 180.01 };
        assert!(!past_antimeridian.is_valid());

        let nan = BoundingBox { south: f64::NAN, west: 0.0, north: 1.0, east: 1.0 };
        assert!(!nan.is_valid());
    }

    #[test]
    fn test_bounding_box_contains_and_center() {
        let bbox = BoundingBox { south: 0.0, west: 10.0, north: 2.0, east: 14.0 };
        assert!(bbox.contains(&GeoPoint::new(1.0, 12.0)));
        assert!(bbox.contains(&GeoPoint::new(0.0, 10.0)));
        assert!(!bbox.contains(&GeoPoint::new(2.1, 12.0)));
        assert_eq!(bbox.center(), GeoPoint::new(1.0, 12.0));
    }

    #[test]
    fn test_green_polygon_validity() {
        assert!(!GreenPolygon::default().is_valid());
        assert!(!GreenPolygon::new(vec![GeoPoint::new(0.0, 0.0); 2]).is_valid());
        assert!(GreenPolygon::new(vec![GeoPoint::new(0.0, 0.0); 3]).is_valid());
    }

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.bbox_padding_deg, 0.01);
        assert_eq!(config.query_timeout_secs, 25);
    }

    #[cfg(feature = "ffi")]
    #[test]
    fn test_ffi_decode_reports_malformed_input() {
        assert_eq!(ffi::ffi_decode_polyline(String::new()), Some(Vec::new()));
        assert_eq!(
            ffi::ffi_decode_polyline("_p~iF~ps|U".to_string()),
            Some(vec![GeoPoint::new(38.5, -120.2)])
        );
        assert_eq!(ffi::ffi_decode_polyline("_p~iF".to_string()), None);
        assert_eq!(ffi::ffi_decode_polyline("_p~iF ps|U".to_string()), None);
    }

    #[cfg(all(feature = "ffi", feature = "http"))]
    #[test]
    fn test_ffi_parse_overpass_reports_invalid_json() {
        assert_eq!(
            ffi::ffi_parse_overpass_response(r#"{"elements": []}"#.to_string()),
            Some(Vec::new())
        );
        assert_eq!(ffi::ffi_parse_overpass_response("<html>busy</html>".to_string()), None);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_compute_exposures_parallel() {
        let park = GreenPolygon::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ]);
        let routes = vec![
            vec![GeoPoint::new(0.2, 0.2), GeoPoint::new(0.8, 0.8)],
            vec![GeoPoint::new(5.0, 5.0), GeoPoint::new(5.5, 5.5)],
            vec![GeoPoint::new(0.5, 0.5)],
        ];
        let results = compute_exposures_parallel(&routes, vec![park.clone()]);
        assert_eq!(results, vec![100.0, 0.0, 0.0]);
        for (route, pct) in routes.iter().zip(&results) {
            assert_eq!(*pct, compute_exposure(route, &[park.clone()]));
        }
    }
}
