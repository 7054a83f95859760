use crate::models::domain::{FacilityRecord, OrderedStop, RecommendationResult, UserLocation};
use serde::{Deserialize, Serialize};

/// Response for the recommend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub user_location: UserLocation,
    pub recommendations: Vec<RecommendationResult>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub catalog_size: usize,
    pub model_loaded: bool,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
}

/// Catalog peek for troubleshooting data loads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDebugResponse {
    pub count: usize,
    pub sample: Vec<FacilityRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaResponse {
    pub seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub geometry: Vec<[f64; 2]>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub ordered: Vec<OrderedStop>,
    pub geometry: Vec<[f64; 2]>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: Option<f64>,
}
