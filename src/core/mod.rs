// Core algorithm exports
pub mod availability;
pub mod distance;
pub mod features;
pub mod model;
pub mod normalize;
pub mod recommender;

pub use availability::is_open_now;
pub use distance::haversine_distance;
pub use features::{build_signals, FacilitySignals, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{load_model, ModelArtifact, ModelError, ScoringModel};
pub use normalize::{discount_to_bit, parse_hour, rate_to_number, yesno_to_bit};
pub use recommender::{RankedFacilities, RecommendError, Recommender, DEFAULT_TOP_K};
