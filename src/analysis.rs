//! # Route Analysis
//!
//! Sequences the pipeline for one route:
//!
//! 1. Reject routes with fewer than 2 points
//! 2. Padded bounding box of the route, validated
//! 3. Green-space query for the box
//! 4. Fetch green polygons from a [`GreenSpaceSource`]
//! 5. Aggregate exposure and total distance
//!
//! Input problems in steps 1-3 are returned as [`AnalysisError`]. A failed fetch in
//! step 4 is not: the distance of a route does not depend on green-space data, so
//! the analysis continues with no polygons and records the failure as
//! [`GreenSpaceOutcome::Unavailable`].
//!
//! Callers with an async source (see the `http` feature) can drive the same steps
//! with [`plan_green_space_query`] and [`finish_analysis`].

use log::{debug, info, warn};

use crate::exposure::compute_exposure_breakdown;
use crate::geo_utils::{bounding_box_of, polyline_length_km};
use crate::polyline::decode_polyline;
use crate::query::{build_green_space_query_with_timeout, GreenSpaceQuery};
use crate::{
    AnalysisConfig, AnalysisError, BoundingBox, ExposureResult, FetchError, GeoPoint,
    GreenPolygon,
};

/// Provider of green-space polygons for a query area.
///
/// Any `Fn(&BoundingBox) -> Result<Vec<GreenPolygon>, FetchError>` is a source, which
/// keeps tests and simple callers free of boilerplate:
///
/// ```rust
/// use green_exposure::{analyze_route, BoundingBox, FetchError, GeoPoint, GreenPolygon};
///
/// let offline = |_: &BoundingBox| -> Result<Vec<GreenPolygon>, FetchError> {
///     Err(FetchError::new("no network"))
/// };
/// let route = vec![GeoPoint::new(51.5074, -0.1278), GeoPoint::new(51.5090, -0.1300)];
///
/// let result = analyze_route(&route, &offline).unwrap();
/// assert_eq!(result.green_percentage, 0.0);
/// assert!(result.total_distance_km > 0.2);
/// ```
pub trait GreenSpaceSource {
    fn fetch_green_spaces(&self, query: &GreenSpaceQuery) -> Result<Vec<GreenPolygon>, FetchError>;
}

impl<F> GreenSpaceSource for F
where
    F: Fn(&BoundingBox) -> Result<Vec<GreenPolygon>, FetchError>,
{
    fn fetch_green_spaces(&self, query: &GreenSpaceQuery) -> Result<Vec<GreenPolygon>, FetchError> {
        self(&query.bounding_box)
    }
}

/// What the green-space fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GreenSpaceOutcome {
    /// The source answered; the list may be empty or contain degenerate polygons.
    Fetched(Vec<GreenPolygon>),
    /// The source failed; the analysis ran with no green spaces.
    Unavailable { reason: String },
}

impl GreenSpaceOutcome {
    /// Polygons to analyse against; empty when unavailable.
    pub fn polygons(&self) -> &[GreenPolygon] {
        match self {
            Self::Fetched(polygons) => polygons,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

impl From<Result<Vec<GreenPolygon>, FetchError>> for GreenSpaceOutcome {
    fn from(result: Result<Vec<GreenPolygon>, FetchError>) -> Self {
        match result {
            Ok(polygons) => Self::Fetched(polygons),
            Err(e) => Self::Unavailable { reason: e.message },
        }
    }
}

/// Detailed report of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteAnalysis {
    pub result: ExposureResult,
    /// Green part of `result.total_distance_km`
    pub green_distance_km: f64,
    pub bounding_box: BoundingBox,
    pub query: GreenSpaceQuery,
    pub green_spaces: GreenSpaceOutcome,
}

/// Analyse a route with the default [`AnalysisConfig`].
pub fn analyze_route<S>(route: &[GeoPoint], source: &S) -> Result<ExposureResult, AnalysisError>
where
    S: GreenSpaceSource + ?Sized,
{
    analyze_route_with_config(route, source, &AnalysisConfig::default())
}

/// Analyse a route with an explicit configuration.
pub fn analyze_route_with_config<S>(
    route: &[GeoPoint],
    source: &S,
    config: &AnalysisConfig,
) -> Result<ExposureResult, AnalysisError>
where
    S: GreenSpaceSource + ?Sized,
{
    analyze_route_detailed(route, source, config).map(|analysis| analysis.result)
}

/// Analyse a route and return the full [`RouteAnalysis`].
pub fn analyze_route_detailed<S>(
    route: &[GeoPoint],
    source: &S,
    config: &AnalysisConfig,
) -> Result<RouteAnalysis, AnalysisError>
where
    S: GreenSpaceSource + ?Sized,
{
    let query = plan_green_space_query(route, config)?;
    let outcome = GreenSpaceOutcome::from(source.fetch_green_spaces(&query));
    Ok(finish_analysis(route, query, outcome))
}

/// Decode an encoded polyline (precision 5) and analyse it.
pub fn analyze_encoded_route<S>(
    encoded: &str,
    source: &S,
    config: &AnalysisConfig,
) -> Result<RouteAnalysis, AnalysisError>
where
    S: GreenSpaceSource + ?Sized,
{
    let route = decode_polyline(encoded)?;
    debug!("Decoded polyline of {} bytes into {} points", encoded.len(), route.len());
    analyze_route_detailed(&route, source, config)
}

/// Validate the route and build the query for its bounding box (steps 1-3).
pub fn plan_green_space_query(
    route: &[GeoPoint],
    config: &AnalysisConfig,
) -> Result<GreenSpaceQuery, AnalysisError> {
    if route.len() < 2 {
        return Err(AnalysisError::Route { points: route.len() });
    }

    let bbox = bounding_box_of(route, config.bbox_padding_deg)?;
    debug!(
        "Route bounding box: S={:.5} W={:.5} N={:.5} E={:.5}",
        bbox.south, bbox.west, bbox.north, bbox.east
    );

    build_green_space_query_with_timeout(&bbox, config.query_timeout_secs)
}

/// Aggregate exposure once the green-space fetch has settled (step 5).
pub fn finish_analysis(
    route: &[GeoPoint],
    query: GreenSpaceQuery,
    green_spaces: GreenSpaceOutcome,
) -> RouteAnalysis {
    if let GreenSpaceOutcome::Unavailable { reason } = &green_spaces {
        warn!("Green spaces unavailable, continuing without them: {}", reason);
    }

    let breakdown = compute_exposure_breakdown(route, green_spaces.polygons());
    let result = ExposureResult {
        total_distance_km: polyline_length_km(route),
        green_percentage: breakdown.percentage(),
    };

    info!(
        "Analysed route: {} points, {:.3} km, {:.1}% green ({} polygons)",
        route.len(),
        result.total_distance_km,
        result.green_percentage,
        green_spaces.polygons().len()
    );

    RouteAnalysis {
        result,
        green_distance_km: breakdown.green_distance_km,
        bounding_box: query.bounding_box,
        query,
        green_spaces,
    }
}
