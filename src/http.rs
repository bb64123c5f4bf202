//! HTTP clients for the providers around the analysis engine.
//!
//! - [`OsrmClient`] - walking route between two points (encoded polyline)
//! - [`OverpassClient`] - green-space polygons for a [`GreenSpaceQuery`]
//! - [`NominatimClient`] - place name search
//! - [`WalkAnalyzer`] - start/end to [`WalkAnalysis`] using all three
//!
//! The engine itself never depends on these. Retries live here: the Overpass
//! client retries rate-limited and gateway-timeout responses with exponential
//! backoff, the analysis pipeline does not retry anything.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::analysis::{finish_analysis, plan_green_space_query, GreenSpaceOutcome, RouteAnalysis};
use crate::polyline::decode_polyline;
use crate::query::GreenSpaceQuery;
use crate::{AnalysisConfig, AnalysisError, FetchError, GeoPoint, GreenPolygon};

/// Provider endpoints and client behaviour.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ProviderConfig {
    /// OSRM base URL, with trailing slash
    pub osrm_base_url: String,
    /// Overpass interpreter endpoint
    pub overpass_url: String,
    /// Nominatim base URL, with trailing slash
    pub nominatim_base_url: String,
    /// Sent with every request (Nominatim and Overpass require one)
    pub user_agent: String,
    /// Per-request timeout. Default: 30 seconds
    pub request_timeout_secs: u64,
    /// Overpass retries on 429/504. Default: 3
    pub max_retries: u32,
    /// First retry delay, doubled per retry. Default: 500ms
    pub retry_backoff_ms: u64,
    pub analysis: AnalysisConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            osrm_base_url: "https://router.project-osrm.org/".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org/".to_string(),
            user_agent: concat!("green-exposure/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 500,
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Errors from provider clients and the walk pipeline.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no walking route found (code {code})")]
    NoRoute { code: String },

    #[error("empty route geometry")]
    EmptyPolyline,

    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("invalid coordinate in geocoding result: {0}")]
    InvalidCoordinate(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

fn build_client(config: &ProviderConfig) -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .user_agent(config.user_agent.as_str())
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?)
}

// ============================================================================
// Overpass
// ============================================================================

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
    #[serde(default)]
    geometry: Option<Vec<OverpassNode>>,
}

#[derive(Debug, Deserialize)]
struct OverpassNode {
    lat: f64,
    lon: f64,
}

/// Parse an Overpass `out geom` JSON response into polygons.
///
/// Elements without geometry are dropped. Polygons are returned as-is, including
/// ones with fewer than 3 vertices; the aggregator filters those.
pub fn parse_overpass_response(json: &str) -> Result<Vec<GreenPolygon>, serde_json::Error> {
    let response: OverpassResponse = serde_json::from_str(json)?;
    Ok(polygons_from_elements(response.elements))
}

fn polygons_from_elements(elements: Vec<OverpassElement>) -> Vec<GreenPolygon> {
    elements
        .into_iter()
        .filter_map(|element| {
            let geometry = element.geometry?;
            if let Some(tags) = &element.tags {
                debug!(
                    "Overpass {} {}: {} vertices ({})",
                    element.kind,
                    element.id,
                    geometry.len(),
                    tags.get("name").map(String::as_str).unwrap_or("unnamed")
                );
            }
            Some(GreenPolygon::new(
                geometry.into_iter().map(|n| GeoPoint::new(n.lat, n.lon)).collect(),
            ))
        })
        .collect()
}

/// Client for an Overpass API interpreter.
pub struct OverpassClient {
    client: Client,
    url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl OverpassClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::with_client(build_client(config)?, config))
    }

    fn with_client(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            url: config.overpass_url.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Run the query and return the polygons it finds.
    pub async fn fetch_green_spaces(
        &self,
        query: &GreenSpaceQuery,
    ) -> Result<Vec<GreenPolygon>, FetchError> {
        let ql = query.to_overpass_ql();
        let start = Instant::now();
        let mut retries = 0;

        loop {
            let response = self
                .client
                .post(&self.url)
                .form(&[("data", ql.as_str())])
                .send()
                .await
                .map_err(|e| FetchError::new(format!("Overpass request error: {}", e)))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::GATEWAY_TIMEOUT {
                retries += 1;
                if retries > self.max_retries {
                    return Err(FetchError::new(format!(
                        "Overpass returned HTTP {} after {} retries",
                        status, self.max_retries
                    )));
                }
                let wait = self.retry_backoff * (1u32 << (retries - 1).min(4));
                warn!("[Overpass] HTTP {}, retry {} after {:?}", status, retries, wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::new(format!("Overpass returned HTTP {}", status)));
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::new(format!("Overpass body error: {}", e)))?;
            let polygons = parse_overpass_response(&body)
                .map_err(|e| FetchError::new(format!("Overpass JSON parse error: {}", e)))?;

            info!(
                "[Overpass] {} green polygons ({:.1}KB) in {:?}",
                polygons.len(),
                body.len() as f64 / 1024.0,
                start.elapsed()
            );
            return Ok(polygons);
        }
    }
}

// ============================================================================
// OSRM
// ============================================================================

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

/// One route returned by OSRM.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OsrmRoute {
    /// Encoded polyline (precision 5)
    pub geometry: String,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub duration: f64,
}

/// Client for the OSRM route service (foot profile).
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::with_client(build_client(config)?, config))
    }

    fn with_client(client: Client, config: &ProviderConfig) -> Self {
        Self { client, base_url: config.osrm_base_url.clone() }
    }

    /// First walking route from `start` to `end`.
    pub async fn walking_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> Result<OsrmRoute, ProviderError> {
        // OSRM takes lng,lat pairs
        let url = format!(
            "{}route/v1/foot/{},{};{},{}",
            self.base_url, start.longitude, start.latitude, end.longitude, end.latitude
        );

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "polyline")])
            .send()
            .await?;

        let status = response.status();
        // OSRM reports NoRoute with a 400 and a JSON body, so parse before checking status
        let body = response.text().await?;
        let parsed: OsrmResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Status { provider: "OSRM", status: status.as_u16() });
            }
            Err(e) => return Err(e.into()),
        };

        first_route(parsed)
    }
}

fn first_route(response: OsrmResponse) -> Result<OsrmRoute, ProviderError> {
    if response.code != "Ok" {
        return Err(ProviderError::NoRoute { code: response.code });
    }
    response
        .routes
        .into_iter()
        .next()
        .ok_or(ProviderError::NoRoute { code: response.code })
}

// ============================================================================
// Nominatim
// ============================================================================

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// A geocoded place.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub point: GeoPoint,
}

fn locations_from_places(places: Vec<NominatimPlace>) -> Result<Vec<Location>, ProviderError> {
    places
        .into_iter()
        .map(|place| {
            let lat = place
                .lat
                .parse::<f64>()
                .map_err(|_| ProviderError::InvalidCoordinate(place.lat.clone()))?;
            let lng = place
                .lon
                .parse::<f64>()
                .map_err(|_| ProviderError::InvalidCoordinate(place.lon.clone()))?;
            Ok(Location { name: place.display_name, point: GeoPoint::new(lat, lng) })
        })
        .collect()
}

/// Client for Nominatim place search.
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::with_client(build_client(config)?, config))
    }

    fn with_client(client: Client, config: &ProviderConfig) -> Self {
        Self { client, base_url: config.nominatim_base_url.clone() }
    }

    /// Up to `limit` places matching `query`. A blank query returns no places
    /// without contacting the server.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Location>, ProviderError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { provider: "Nominatim", status: status.as_u16() });
        }

        let places: Vec<NominatimPlace> = serde_json::from_str(&response.text().await?)?;
        locations_from_places(places)
    }

    async fn first(&self, query: &str) -> Result<Location, ProviderError> {
        self.search(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::LocationNotFound(query.to_string()))
    }
}

// ============================================================================
// Walk Analysis
// ============================================================================

/// Result of analysing a walk between two places.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkAnalysis {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub start_name: Option<String>,
    pub end_name: Option<String>,
    /// Route geometry as returned by OSRM
    pub polyline: String,
    /// OSRM's own distance for the route
    pub routed_distance_km: f64,
    pub duration_s: f64,
    pub analysis: RouteAnalysis,
}

/// Flat view of a [`WalkAnalysis`] for FFI callers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct WalkSummary {
    pub start_name: Option<String>,
    pub end_name: Option<String>,
    pub polyline: String,
    pub routed_distance_km: f64,
    pub duration_s: f64,
    pub total_distance_km: f64,
    pub green_percentage: f64,
    pub green_spaces_available: bool,
}

impl WalkAnalysis {
    pub fn summary(&self) -> WalkSummary {
        WalkSummary {
            start_name: self.start_name.clone(),
            end_name: self.end_name.clone(),
            polyline: self.polyline.clone(),
            routed_distance_km: self.routed_distance_km,
            duration_s: self.duration_s,
            total_distance_km: self.analysis.result.total_distance_km,
            green_percentage: self.analysis.result.green_percentage,
            green_spaces_available: self.analysis.green_spaces.is_available(),
        }
    }
}

/// Routes a walk, fetches green spaces along it and computes exposure.
pub struct WalkAnalyzer {
    osrm: OsrmClient,
    overpass: OverpassClient,
    nominatim: NominatimClient,
    analysis: AnalysisConfig,
}

impl WalkAnalyzer {
    /// Create an analyzer; the three clients share one connection pool.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(&config)?;
        Ok(Self {
            osrm: OsrmClient::with_client(client.clone(), &config),
            overpass: OverpassClient::with_client(client.clone(), &config),
            nominatim: NominatimClient::with_client(client, &config),
            analysis: config.analysis,
        })
    }

    /// Analyse the walking route between two coordinates.
    pub async fn analyze_walk(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> Result<WalkAnalysis, ProviderError> {
        self.analyze_named_walk(start, end, None, None).await
    }

    /// Geocode both place names (concurrently), then analyse the walk between them.
    pub async fn analyze_walk_by_name(
        &self,
        start: &str,
        end: &str,
    ) -> Result<WalkAnalysis, ProviderError> {
        let (from, to) =
            futures::try_join!(self.nominatim.first(start), self.nominatim.first(end))?;
        info!("[WalkAnalyzer] '{}' -> '{}'", from.name, to.name);
        self.analyze_named_walk(from.point, to.point, Some(from.name), Some(to.name)).await
    }

    /// Place search with the analyzer's geocoding client.
    pub async fn search_location(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Location>, ProviderError> {
        self.nominatim.search(query, limit).await
    }

    async fn analyze_named_walk(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        start_name: Option<String>,
        end_name: Option<String>,
    ) -> Result<WalkAnalysis, ProviderError> {
        let route = self.osrm.walking_route(start, end).await?;
        if route.geometry.trim().is_empty() {
            return Err(ProviderError::EmptyPolyline);
        }

        let points = decode_polyline(&route.geometry).map_err(AnalysisError::from)?;
        let query = plan_green_space_query(&points, &self.analysis)?;
        let outcome = GreenSpaceOutcome::from(self.overpass.fetch_green_spaces(&query).await);
        let analysis = finish_analysis(&points, query, outcome);

        Ok(WalkAnalysis {
            start,
            end,
            start_name,
            end_name,
            polyline: route.geometry,
            routed_distance_km: route.distance / 1000.0,
            duration_s: route.duration,
            analysis,
        })
    }
}

/// Blocking wrapper for FFI - runs the walk analysis on a fresh tokio runtime.
pub fn analyze_walk_blocking(
    start: GeoPoint,
    end: GeoPoint,
    config: ProviderConfig,
) -> Result<WalkAnalysis, ProviderError> {
    use tokio::runtime::Builder;

    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| ProviderError::Runtime(e.to_string()))?;

    let analyzer = WalkAnalyzer::new(config)?;
    rt.block_on(analyzer.analyze_walk(start, end))
}
