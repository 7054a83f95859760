use crate::core::{
    features::{build_signals, FacilitySignals, FeatureVector},
    model::{ModelError, ScoringModel},
};
use crate::models::{FacilityRecord, RecommendationResult, UserLocation};
use crate::services::Catalog;
use std::sync::Arc;
use thiserror::Error;

/// Number of recommendations returned when the caller does not ask
pub const DEFAULT_TOP_K: usize = 5;

/// Pipeline-level failures; any of these aborts the whole request
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Model not loaded.")]
    ModelUnavailable,

    #[error("No parking data loaded.")]
    CatalogEmpty,

    #[error("No valid parking rows to score.")]
    NoScoreableRows,

    #[error("Model prediction failed: {0}")]
    ScoringFailure(#[from] ModelError),
}

/// Result of a recommendation pass
#[derive(Debug)]
pub struct RankedFacilities {
    pub user_location: UserLocation,
    pub recommendations: Vec<RecommendationResult>,
    pub total_candidates: usize,
}

/// Ranks the catalog for a user with the loaded scoring model
///
/// Holds read-only snapshots of the catalog and model, so clones are cheap and
/// requests never coordinate with each other.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    model: Option<Arc<dyn ScoringModel>>,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, model: Option<Arc<dyn ScoringModel>>) -> Self {
        Self { catalog, model }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_description(&self) -> Option<String> {
        self.model.as_ref().map(|m| m.describe())
    }

    /// Score every facility for `user` and return the best `top_k`
    ///
    /// # Pipeline Stages
    /// 1. Build one feature vector per facility with usable coordinates
    /// 2. Score the whole batch in a single model call
    /// 3. Stable sort by score, descending, so ties keep catalog order
    /// 4. Truncate to `top_k`
    pub fn recommend(
        &self,
        user: UserLocation,
        top_k: usize,
    ) -> Result<RankedFacilities, RecommendError> {
        let model = self.model.as_ref().ok_or(RecommendError::ModelUnavailable)?;
        if self.catalog.is_empty() {
            return Err(RecommendError::CatalogEmpty);
        }

        let mut vectors: Vec<FeatureVector> = Vec::with_capacity(self.catalog.len());
        let mut partial: Vec<RecommendationResult> = Vec::with_capacity(self.catalog.len());

        for record in self.catalog.iter() {
            let Some(signals) = build_signals(record, &user) else {
                tracing::debug!("Skipping facility {:?} with invalid coordinates", record.name);
                continue;
            };
            vectors.push(signals.to_vector());
            partial.push(unscored_result(record, &signals));
        }

        if vectors.is_empty() {
            return Err(RecommendError::NoScoreableRows);
        }

        let scores = model.predict(&vectors)?;
        if scores.len() != vectors.len() {
            return Err(ModelError::LengthMismatch {
                expected: vectors.len(),
                got: scores.len(),
            }
            .into());
        }

        let total_candidates = partial.len();
        let mut ranked: Vec<RecommendationResult> = partial
            .into_iter()
            .zip(scores)
            .map(|(mut result, score)| {
                result.score = score;
                result
            })
            .collect();

        // `sort_by` is stable: equal scores stay in catalog order
        ranked.sort_by(|a, b| rank_key(b.score).total_cmp(&rank_key(a.score)));
        ranked.truncate(top_k);

        Ok(RankedFacilities {
            user_location: user,
            recommendations: ranked,
            total_candidates,
        })
    }
}

/// NaN scores rank below every real score
fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

fn unscored_result(record: &FacilityRecord, signals: &FacilitySignals) -> RecommendationResult {
    RecommendationResult {
        name: record.name.clone(),
        details: record.details.clone(),
        address: record.address.clone(),
        link: record.link.clone(),
        city: record.city.clone(),
        lat: record.latitude,
        lng: record.longitude,
        distance_km: signals.distance_km,
        open_now: signals.open_now,
        opening: record.opening.clone(),
        closing: record.closing.clone(),
        guards: signals.guards,
        cctvs: signals.cctvs,
        initial_rate: signals.initial_rate,
        pwd_discount: signals.pwd_discount,
        street_parking: signals.street_parking,
        score: 0.0,
    }
}
