use crate::models::domain::{LatLon, UserLocation};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /recommend`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub user_lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub user_lng: f64,
    #[validate(range(min = 0, max = 23))]
    pub time_of_day: u8,
    /// Accepted for client compatibility; not used for scoring
    #[serde(default)]
    pub day_of_week: Option<u8>,
}

impl RecommendRequest {
    pub fn user_location(&self) -> UserLocation {
        UserLocation {
            lat: self.user_lat,
            lng: self.user_lng,
            time_of_day: self.time_of_day,
        }
    }
}

/// Query string of `POST /recommend`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecommendQuery {
    #[validate(range(min = 1))]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaRequest {
    pub origin: LatLon,
    pub destination: LatLon,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(rename = "departAt", default, skip_serializing_if = "Option::is_none")]
    pub depart_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: LatLon,
    pub destination: LatLon,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<LatLon>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub origin: LatLon,
    pub destination: LatLon,
    #[serde(default)]
    pub stops: Vec<LatLon>,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "car".to_string()
}
