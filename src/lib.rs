//! Spark Parking - parking recommendation service
//!
//! Ranks parking facilities for a user's location and hour with a pre-trained
//! scoring model, and proxies routing queries to OSRM or an alternate router.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{haversine_distance, load_model, Recommender, RecommendError, ScoringModel};
pub use models::{FacilityRecord, RecommendRequest, RecommendResponse, RecommendationResult, UserLocation};
pub use services::{Catalog, CsvDirectorySource, RoutingService};
