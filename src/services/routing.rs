use crate::models::{
    EtaRequest, EtaResponse, LatLon, OptimizeRequest, OptimizeResponse, OrderedStop,
    RouteRequest, RouteResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default user agent for outbound routing requests
pub const DEFAULT_USER_AGENT: &str = "Spark/1.0";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Errors that can occur when talking to a routing backend
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("routing service returned {code}: {message}")]
    Upstream { code: String, message: String },

    #[error("no route found")]
    NoRoute,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A path as `[lon, lat]` pairs plus its travel time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSummary {
    pub geometry: Vec<[f64; 2]>,
    pub duration_seconds: Option<f64>,
}

/// A multi-stop trip with stops in visiting order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripSummary {
    pub ordered: Vec<LatLon>,
    pub geometry: Vec<[f64; 2]>,
    pub duration_seconds: Option<f64>,
}

/// A service able to answer travel-time, route and stop-ordering queries
///
/// `mode` is the client's travel mode (`car`, `walk`, `motor`, `commute`);
/// each backend maps it to whatever profile it understands.
#[async_trait]
pub trait RoutingBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn eta(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: &str,
    ) -> Result<Option<f64>, RoutingError>;

    async fn route(
        &self,
        origin: LatLon,
        destination: LatLon,
        stops: &[LatLon],
        mode: &str,
    ) -> Result<RouteSummary, RoutingError>;

    async fn optimize(
        &self,
        origin: LatLon,
        stops: &[LatLon],
        destination: LatLon,
        mode: &str,
    ) -> Result<TripSummary, RoutingError>;
}

/// Shared HTTP settings for routing clients
#[derive(Debug, Clone)]
pub struct RoutingClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for RoutingClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl RoutingClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub(crate) fn build_client(&self) -> Result<Client, RoutingError> {
        Ok(Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()?)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Orient a point from a backend of unknown convention as `[lon, lat]`
///
/// A pair that reads as a valid `(lat, lon)` is swapped; anything else is
/// assumed to already be `(lon, lat)`.
pub fn normalize_point(a: f64, b: f64) -> [f64; 2] {
    if (-90.0..=90.0).contains(&a) && (-180.0..=180.0).contains(&b) {
        [b, a]
    } else {
        [a, b]
    }
}

fn normalize_geometry(raw: &[Vec<f64>]) -> Vec<[f64; 2]> {
    raw.iter()
        .filter_map(|point| match point.as_slice() {
            [a, b, ..] => Some(normalize_point(*a, *b)),
            _ => None,
        })
        .collect()
}

/// Raw shapes returned by an alternate router; geometry orientation unknown
#[derive(Debug, Deserialize)]
struct AlternateRoute {
    #[serde(default)]
    geometry: Vec<Vec<f64>>,
    #[serde(rename = "durationSeconds")]
    duration_seconds: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AlternateTrip {
    #[serde(default)]
    ordered: Vec<OrderedStop>,
    #[serde(default)]
    geometry: Option<Vec<Vec<f64>>>,
    #[serde(rename = "durationSeconds")]
    duration_seconds: Option<f64>,
}

/// Alternate router reached over HTTP
///
/// The remote service speaks the same JSON contract this API exposes at
/// `/eta`, `/route` and `/optimize`.
pub struct HttpRoutingBackend {
    client: Client,
    config: RoutingClientConfig,
}

impl HttpRoutingBackend {
    pub fn new(config: RoutingClientConfig) -> Result<Self, RoutingError> {
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned + Send>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RoutingError> {
        let url = self.config.endpoint(path);
        tracing::debug!("Calling alternate router: {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RoutingBackend for HttpRoutingBackend {
    fn name(&self) -> &str {
        "alternate"
    }

    async fn eta(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: &str,
    ) -> Result<Option<f64>, RoutingError> {
        let request = EtaRequest {
            origin,
            destination,
            mode: mode.to_string(),
            depart_at: None,
        };
        let response: EtaResponse = self.post("eta", &request).await?;
        Ok(response.seconds)
    }

    async fn route(
        &self,
        origin: LatLon,
        destination: LatLon,
        stops: &[LatLon],
        mode: &str,
    ) -> Result<RouteSummary, RoutingError> {
        let request = RouteRequest {
            origin,
            destination,
            mode: mode.to_string(),
            stops: (!stops.is_empty()).then(|| stops.to_vec()),
        };
        let response: AlternateRoute = self.post("route", &request).await?;
        Ok(RouteSummary {
            geometry: normalize_geometry(&response.geometry),
            duration_seconds: response.duration_seconds,
        })
    }

    async fn optimize(
        &self,
        origin: LatLon,
        stops: &[LatLon],
        destination: LatLon,
        mode: &str,
    ) -> Result<TripSummary, RoutingError> {
        let request = OptimizeRequest {
            origin,
            destination,
            stops: stops.to_vec(),
            mode: mode.to_string(),
        };
        let response: AlternateTrip = self.post("optimize", &request).await?;
        Ok(TripSummary {
            ordered: response
                .ordered
                .into_iter()
                .map(|s| LatLon::new(s.latitude, s.longitude))
                .collect(),
            geometry: response
                .geometry
                .map(|g| normalize_geometry(&g))
                .unwrap_or_default(),
            duration_seconds: response.duration_seconds,
        })
    }
}

/// Routing front door: alternate router first, OSRM as the fallback
///
/// Each backend gets exactly one attempt per request.
#[derive(Clone)]
pub struct RoutingService {
    alternate: Option<Arc<dyn RoutingBackend>>,
    fallback: Arc<dyn RoutingBackend>,
}

impl RoutingService {
    pub fn new(fallback: Arc<dyn RoutingBackend>) -> Self {
        Self {
            alternate: None,
            fallback,
        }
    }

    pub fn with_alternate(mut self, alternate: Arc<dyn RoutingBackend>) -> Self {
        self.alternate = Some(alternate);
        self
    }

    pub fn has_alternate(&self) -> bool {
        self.alternate.is_some()
    }

    pub async fn eta(&self, req: &EtaRequest) -> Result<EtaResponse, RoutingError> {
        if let Some(alternate) = &self.alternate {
            match alternate.eta(req.origin, req.destination, &req.mode).await {
                Ok(Some(seconds)) if seconds >= 0.0 => {
                    return Ok(EtaResponse {
                        seconds: Some(seconds),
                    })
                }
                Ok(other) => {
                    tracing::debug!("{} router gave unusable ETA {:?}, falling back", alternate.name(), other)
                }
                Err(e) => tracing::debug!("{} router ETA failed, falling back: {}", alternate.name(), e),
            }
        }

        let seconds = self
            .fallback
            .eta(req.origin, req.destination, &req.mode)
            .await?;
        Ok(EtaResponse { seconds })
    }

    pub async fn route(&self, req: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        let stops = req.stops.as_deref().unwrap_or_default();

        if let Some(alternate) = &self.alternate {
            match alternate.route(req.origin, req.destination, stops, &req.mode).await {
                Ok(summary) => return Ok(summary.into()),
                Err(e) => tracing::debug!("{} router route failed, falling back: {}", alternate.name(), e),
            }
        }

        let summary = self
            .fallback
            .route(req.origin, req.destination, stops, &req.mode)
            .await?;
        Ok(summary.into())
    }

    pub async fn optimize(&self, req: &OptimizeRequest) -> Result<OptimizeResponse, RoutingError> {
        if let Some(alternate) = &self.alternate {
            match alternate
                .optimize(req.origin, &req.stops, req.destination, &req.mode)
                .await
            {
                Ok(trip) => return Ok(trip.into()),
                Err(e) => tracing::debug!("{} router optimize failed, falling back: {}", alternate.name(), e),
            }
        }

        let trip = self
            .fallback
            .optimize(req.origin, &req.stops, req.destination, &req.mode)
            .await?;
        Ok(trip.into())
    }
}

impl From<RouteSummary> for RouteResponse {
    fn from(summary: RouteSummary) -> Self {
        Self {
            geometry: summary.geometry,
            duration_seconds: summary.duration_seconds,
        }
    }
}

impl From<TripSummary> for OptimizeResponse {
    fn from(trip: TripSummary) -> Self {
        Self {
            ordered: trip.ordered.into_iter().map(OrderedStop::from).collect(),
            geometry: trip.geometry,
            duration_seconds: trip.duration_seconds,
        }
    }
}
