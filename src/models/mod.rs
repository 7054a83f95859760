// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CellValue, FacilityRecord, LatLon, OrderedStop, RecommendationResult, UserLocation};
pub use requests::{EtaRequest, OptimizeRequest, RecommendQuery, RecommendRequest, RouteRequest};
pub use responses::{
    EtaResponse, ErrorResponse, HealthResponse, HomeResponse, MetaDebugResponse, OptimizeResponse,
    RecommendResponse, RouteResponse,
};
