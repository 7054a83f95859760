//! OSRM client for the Route and Trip services.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/>

use crate::models::LatLon;
use crate::services::routing::{
    RouteSummary, RoutingBackend, RoutingClientConfig, RoutingError, TripSummary,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Map a client travel mode onto an OSRM profile
///
/// Only walking has its own profile; cars, motorcycles and anything unknown
/// are routed as driving.
pub fn osrm_profile(mode: &str) -> &'static str {
    if mode.trim().eq_ignore_ascii_case("walk") {
        "walking"
    } else {
        "driving"
    }
}

/// OSRM Route service response
#[derive(Debug, Deserialize)]
struct RouteServiceResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

/// OSRM Trip service response
#[derive(Debug, Deserialize)]
struct TripServiceResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    trips: Vec<OsrmRoute>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    duration: Option<f64>,
    geometry: Option<GeoJsonLine>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonLine {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

/// Input coordinate snapped to the road network
///
/// Waypoints come back in input order; `waypoint_index` is the position in
/// the optimized trip.
#[derive(Debug, Deserialize)]
struct TripWaypoint {
    location: [f64; 2],
    waypoint_index: Option<usize>,
}

fn check_code(code: &str, message: Option<String>) -> Result<(), RoutingError> {
    if code == "Ok" {
        return Ok(());
    }
    Err(RoutingError::Upstream {
        code: code.to_string(),
        message: message.unwrap_or_default(),
    })
}

fn summarize(route: OsrmRoute) -> RouteSummary {
    RouteSummary {
        geometry: route.geometry.map(|g| g.coordinates).unwrap_or_default(),
        duration_seconds: route.duration,
    }
}

fn coordinate_list(points: &[LatLon]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lon, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// OSRM HTTP client
pub struct OsrmClient {
    client: Client,
    config: RoutingClientConfig,
}

impl std::fmt::Debug for OsrmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl OsrmClient {
    pub fn new(config: RoutingClientConfig) -> Result<Self, RoutingError> {
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    fn route_url(&self, profile: &str, origin: LatLon, destination: LatLon) -> String {
        format!(
            "{}?overview=full&geometries=geojson",
            self.config.endpoint(&format!(
                "route/v1/{}/{}",
                profile,
                coordinate_list(&[origin, destination])
            ))
        )
    }

    fn trip_url(&self, profile: &str, points: &[LatLon]) -> String {
        format!(
            "{}?source=first&destination=last&roundtrip=false&geometries=geojson",
            self.config
                .endpoint(&format!("trip/v1/{}/{}", profile, coordinate_list(points)))
        )
    }

    async fn get_json<T: DeserializeOwned + Send>(&self, url: &str) -> Result<T, RoutingError> {
        tracing::debug!("Calling OSRM: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // OSRM reports failures as JSON with a non-Ok code, often with a 400
        serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                RoutingError::InvalidResponse(e.to_string())
            } else {
                RoutingError::Upstream {
                    code: status.as_u16().to_string(),
                    message: body.chars().take(200).collect(),
                }
            }
        })
    }

    /// Fastest route between two points
    pub async fn fetch_route(
        &self,
        profile: &str,
        origin: LatLon,
        destination: LatLon,
    ) -> Result<RouteSummary, RoutingError> {
        let url = self.route_url(profile, origin, destination);
        let response: RouteServiceResponse = self.get_json(&url).await?;
        check_code(&response.code, response.message)?;

        response
            .routes
            .into_iter()
            .next()
            .map(summarize)
            .ok_or(RoutingError::NoRoute)
    }

    /// Trip from the first point to the last, visiting the rest in the best order
    pub async fn fetch_trip(
        &self,
        profile: &str,
        points: &[LatLon],
    ) -> Result<TripSummary, RoutingError> {
        if points.is_empty() {
            return Ok(TripSummary::default());
        }

        let url = self.trip_url(profile, points);
        let response: TripServiceResponse = self.get_json(&url).await?;
        check_code(&response.code, response.message)?;

        let route = response
            .trips
            .into_iter()
            .next()
            .map(summarize)
            .ok_or(RoutingError::NoRoute)?;

        let ordered = if response.waypoints.is_empty() {
            points.to_vec()
        } else {
            let mut waypoints = response.waypoints;
            waypoints.sort_by_key(|w| w.waypoint_index.unwrap_or(usize::MAX));
            waypoints
                .into_iter()
                .map(|w| LatLon::new(w.location[1], w.location[0]))
                .collect()
        };

        Ok(TripSummary {
            ordered,
            geometry: route.geometry,
            duration_seconds: route.duration_seconds,
        })
    }
}

#[async_trait]
impl RoutingBackend for OsrmClient {
    fn name(&self) -> &str {
        "osrm"
    }

    async fn eta(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: &str,
    ) -> Result<Option<f64>, RoutingError> {
        let route = self
            .fetch_route(osrm_profile(mode), origin, destination)
            .await?;
        Ok(route.duration_seconds)
    }

    async fn route(
        &self,
        origin: LatLon,
        destination: LatLon,
        stops: &[LatLon],
        mode: &str,
    ) -> Result<RouteSummary, RoutingError> {
        let profile = osrm_profile(mode);
        if stops.is_empty() {
            return self.fetch_route(profile, origin, destination).await;
        }

        let mut points = Vec::with_capacity(stops.len() + 2);
        points.push(origin);
        points.extend_from_slice(stops);
        points.push(destination);

        let trip = self.fetch_trip(profile, &points).await?;
        Ok(RouteSummary {
            geometry: trip.geometry,
            duration_seconds: trip.duration_seconds,
        })
    }

    async fn optimize(
        &self,
        origin: LatLon,
        stops: &[LatLon],
        destination: LatLon,
        mode: &str,
    ) -> Result<TripSummary, RoutingError> {
        let mut points = Vec::with_capacity(stops.len() + 2);
        points.push(origin);
        points.extend_from_slice(stops);
        points.push(destination);

        self.fetch_trip(osrm_profile(mode), &points).await
    }
}
